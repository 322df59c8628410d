//! Convert the VOLT source in a font to an OpenType feature file.

use std::io::Write;

use clap::Parser;
use log::warn;
use volt2fea::{Args, Error};

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = buf.timestamp_micros();
            writeln!(buf, "{}: {}: {}", ts, record.level(), record.args())
        })
        .init();

    let args = Args::parse();
    let conversion = volt2fea::run(&args)?;
    for skipped in conversion.skipped() {
        warn!("not converted: {skipped}");
    }
    Ok(())
}
