// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Result;
use structopt::StructOpt;

use cfdna_origin::cli::{self, CfdnaOrigin};

fn setup_logger(opt: &CfdnaOrigin) -> Result<()> {
    let level = if opt.verbose {
        log::LevelFilter::Debug
    } else if opt.quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}", record.level(), message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

pub fn main() -> Result<()> {
    let opt = CfdnaOrigin::from_args();
    setup_logger(&opt)?;
    cli::run(opt)
}
