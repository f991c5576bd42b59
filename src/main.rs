use std::io;

use clap::Parser;
use tinyfs::{cli_interface::TinyFsCli, disk::ImageFiles};
/// a CLI interface to users to create our filesystem in an image file,
/// or to mount an image, do one thing with its files and unmount it again.
///
/// Set `RUST_LOG=debug` to watch every block being allocated.
fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_nanos().init();
    let args = TinyFsCli::parse();
    // image paths are taken relative to the working directory
    tinyfs::cli_interface::run(
        ImageFiles::default(),
        args,
        &mut io::stdin().lock(),
        &mut io::stdout().lock(),
    )
}
