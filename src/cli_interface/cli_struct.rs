use std::path::PathBuf;

use byte_unit::Byte;
use clap::Parser;

use crate::fs::{DEFAULT_BLOCK_SIZE, DEFAULT_DISK_NAME, DEFAULT_DISK_SIZE};

#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about, long_about)]
pub enum TinyFsCli {
    /// create a new file system
    Mkfs(MkfsArgs),
    /// list the files on a volume, the newest first
    Ls(VolumeArgs),
    /// copy a host file, or stdin, into a file on the volume
    Put(PutArgs),
    /// print a file to stdout
    Cat(FileArgs),
    /// delete a file
    Rm(FileArgs),
    /// rename a file
    Mv(MvArgs),
    /// show size, blocks and timestamps of a file
    Stat(FileArgs),
    /// make a file read-only or writable again
    Chmod(ChmodArgs),
    /// show how much of a volume is in use
    Df(VolumeArgs),
}

// which volume to work on, shared by every subcommand
#[derive(clap::Args, Debug, PartialEq)]
pub struct VolumeArgs {
    /// the path of the file system image file
    #[clap(short = 'p', long, default_value = DEFAULT_DISK_NAME)]
    pub image_file_path: String,
    /// the block size of the file system
    #[clap(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,
}

///make a new fs subcommand
#[derive(clap::Args, Debug, PartialEq)]
#[command(author, version, about = "make a new file system")]
pub struct MkfsArgs {
    #[command(flatten)]
    pub volume: VolumeArgs,
    /// the size of the file system, like `10240`, `10 KiB` or `64KB`
    #[clap(short, long, default_value_t = DEFAULT_DISK_SIZE, value_parser = parse_size)]
    pub size: u64,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct FileArgs {
    #[command(flatten)]
    pub volume: VolumeArgs,
    /// the file on the volume, at most 8 bytes
    pub name: String,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct PutArgs {
    #[command(flatten)]
    pub volume: VolumeArgs,
    /// the file on the volume, created if it does not exist
    pub name: String,
    /// the host file to copy, stdin when absent
    #[clap(short, long)]
    pub input: Option<PathBuf>,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct MvArgs {
    #[command(flatten)]
    pub volume: VolumeArgs,
    pub name: String,
    pub new_name: String,
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct ChmodArgs {
    #[command(flatten)]
    pub volume: VolumeArgs,
    pub name: String,
    #[clap(long, conflicts_with = "read_write", required_unless_present = "read_write")]
    pub read_only: bool,
    #[clap(long)]
    pub read_write: bool,
}

impl TinyFsCli {
    /// the volume this command works on
    pub fn volume(&self) -> &VolumeArgs {
        match self {
            TinyFsCli::Mkfs(args) => &args.volume,
            TinyFsCli::Ls(args) | TinyFsCli::Df(args) => args,
            TinyFsCli::Put(args) => &args.volume,
            TinyFsCli::Cat(args) | TinyFsCli::Rm(args) | TinyFsCli::Stat(args) => &args.volume,
            TinyFsCli::Mv(args) => &args.volume,
            TinyFsCli::Chmod(args) => &args.volume,
        }
    }
}

/// parse a size with an optional unit, `10 KiB` is 10240 bytes
fn parse_size(size: &str) -> Result<u64, String> {
    let bytes = Byte::from_str(size).map_err(|e| e.to_string())?;
    u64::try_from(bytes.get_bytes()).map_err(|e| e.to_string())
}


/// test the file subcommands
#[cfg(test)]
mod file_parse_args_tests {
    use super::*;

    fn volume(image_file_path: &str) -> VolumeArgs {
        VolumeArgs {
            image_file_path: image_file_path.to_string(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    #[test]
    fn test_put() {
        let args = TinyFsCli::parse_from(["tinyfs", "put", "-p", "disk", "notes", "-i", "notes.txt"]);
        assert_eq!(
            args,
            TinyFsCli::Put(PutArgs {
                volume: volume("disk"),
                name: "notes".to_string(),
                input: Some(PathBuf::from("notes.txt")),
            })
        );
        let args = TinyFsCli::parse_from(["tinyfs", "put", "notes"]);
        assert_eq!(args.volume(), &volume(DEFAULT_DISK_NAME));
    }

    #[test]
    fn test_mv() {
        let args = TinyFsCli::parse_from(["tinyfs", "mv", "-p", "disk", "old", "new"]);
        assert_eq!(
            args,
            TinyFsCli::Mv(MvArgs {
                volume: volume("disk"),
                name: "old".to_string(),
                new_name: "new".to_string(),
            })
        );
    }

    #[test]
    fn test_chmod_needs_exactly_one_mode() {
        let args = TinyFsCli::parse_from(["tinyfs", "chmod", "a", "--read-only"]);
        assert_eq!(
            args,
            TinyFsCli::Chmod(ChmodArgs {
                volume: volume(DEFAULT_DISK_NAME),
                name: "a".to_string(),
                read_only: true,
                read_write: false,
            })
        );
        assert!(TinyFsCli::try_parse_from(["tinyfs", "chmod", "a"]).is_err());
        assert!(
            TinyFsCli::try_parse_from(["tinyfs", "chmod", "a", "--read-only", "--read-write"])
                .is_err()
        );
    }
}
