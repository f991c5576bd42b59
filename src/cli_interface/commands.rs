//! run one command line against a volume: mount, do one thing, unmount
use std::io::{Read, Write};

use anyhow::{bail, Context};
use byte_unit::Byte;

use super::{ChmodArgs, FileArgs, MkfsArgs, MvArgs, PutArgs, TinyFsCli, VolumeArgs};
use crate::{
    disk::DiskProvider,
    fs::{FileDescriptor, FsConfig, TinyFs},
    FsError,
};

/// run `command` on volumes of `provider`
///
/// `stdin` feeds `put` when no input file is given, everything meant for
/// the user goes to `out`.
pub fn run<P, R, W>(provider: P, command: TinyFsCli, stdin: &mut R, out: &mut W) -> anyhow::Result<()>
where
    P: DiskProvider,
    R: Read,
    W: Write,
{
    let config = FsConfig {
        block_size: command.volume().block_size,
        ..FsConfig::default()
    };
    let mut fs = TinyFs::with_config(provider, config);
    match command {
        TinyFsCli::Mkfs(args) => mkfs(&mut fs, args, out),
        TinyFsCli::Ls(args) => with_volume(&mut fs, &args, |fs| {
            for name in fs.readdir()? {
                writeln!(out, "{name}")?;
            }
            Ok(())
        }),
        TinyFsCli::Put(args) => put(&mut fs, args, stdin, out),
        TinyFsCli::Cat(args) => with_volume(&mut fs, &args.volume, |fs| {
            let fd = open_existing(fs, &args.name)?;
            let bytes = read_to_end(fs, fd)?;
            fs.close(fd)?;
            out.write_all(&bytes)?;
            Ok(())
        }),
        TinyFsCli::Rm(args) => with_volume(&mut fs, &args.volume, |fs| {
            let fd = open_existing(fs, &args.name)?;
            fs.delete(fd)
                .with_context(|| format!("failed to delete {}", args.name))?;
            Ok(())
        }),
        TinyFsCli::Mv(args) => mv(&mut fs, args),
        TinyFsCli::Stat(args) => stat(&mut fs, args, out),
        TinyFsCli::Chmod(args) => chmod(&mut fs, args),
        TinyFsCli::Df(args) => with_volume(&mut fs, &args, |fs| {
            let stats = fs.statfs()?;
            let free_bytes = stats.free_blocks as u64 * stats.block_size as u64;
            writeln!(out, "block size:   {}", stats.block_size)?;
            writeln!(out, "total blocks: {}", stats.total_blocks)?;
            let used_blocks = stats.total_blocks.saturating_sub(stats.free_blocks);
            writeln!(out, "used blocks:  {used_blocks}")?;
            writeln!(out, "free blocks:  {}", stats.free_blocks)?;
            writeln!(
                out,
                "free space:   {}",
                Byte::from_bytes(free_bytes as _).get_appropriate_unit(true)
            )?;
            writeln!(out, "files:        {}", stats.files)?;
            Ok(())
        }),
    }
}

fn mkfs<P: DiskProvider, W: Write>(fs: &mut TinyFs<P>, args: MkfsArgs, out: &mut W) -> anyhow::Result<()> {
    let path = &args.volume.image_file_path;
    fs.format(path, args.size)
        .with_context(|| format!("failed to create a file system in {path}"))?;
    writeln!(
        out,
        "created {path}: {} with {} byte blocks",
        Byte::from_bytes(args.size as _).get_appropriate_unit(true),
        args.volume.block_size
    )?;
    Ok(())
}

fn put<P, R, W>(fs: &mut TinyFs<P>, args: PutArgs, stdin: &mut R, out: &mut W) -> anyhow::Result<()>
where
    P: DiskProvider,
    R: Read,
    W: Write,
{
    let bytes = match &args.input {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut bytes = Vec::new();
            stdin.read_to_end(&mut bytes)?;
            bytes
        }
    };
    with_volume(fs, &args.volume, |fs| {
        let fd = fs.open(&args.name)?;
        fs.write(fd, &bytes)
            .with_context(|| format!("failed to write {}", args.name))?;
        fs.close(fd)?;
        writeln!(out, "wrote {} bytes to {}", bytes.len(), args.name)?;
        Ok(())
    })
}

fn mv<P: DiskProvider>(fs: &mut TinyFs<P>, args: MvArgs) -> anyhow::Result<()> {
    with_volume(fs, &args.volume, |fs| {
        let fd = open_existing(fs, &args.name)?;
        fs.rename(fd, &args.new_name)
            .with_context(|| format!("failed to rename {} to {}", args.name, args.new_name))?;
        fs.close(fd)?;
        Ok(())
    })
}

fn stat<P: DiskProvider, W: Write>(fs: &mut TinyFs<P>, args: FileArgs, out: &mut W) -> anyhow::Result<()> {
    with_volume(fs, &args.volume, |fs| {
        let fd = open_existing(fs, &args.name)?;
        let info = fs.file_info(fd)?;
        fs.close(fd)?;
        writeln!(out, "name:     {}", info.name)?;
        writeln!(
            out,
            "size:     {} in {} blocks",
            Byte::from_bytes(info.size as _).get_appropriate_unit(true),
            info.blocks
        )?;
        writeln!(out, "mode:     {}", if info.read_only { "read-only" } else { "read-write" })?;
        writeln!(out, "created:  {}", info.created_at.0)?;
        writeln!(out, "modified: {}", info.modified_at.0)?;
        writeln!(out, "accessed: {}", info.accessed_at.0)?;
        Ok(())
    })
}

fn chmod<P: DiskProvider>(fs: &mut TinyFs<P>, args: ChmodArgs) -> anyhow::Result<()> {
    with_volume(fs, &args.volume, |fs| {
        if args.read_only {
            fs.make_read_only(&args.name)?;
        } else {
            fs.make_read_write(&args.name)?;
        }
        Ok(())
    })
}

/// mount the volume, run `f`, and unmount even if `f` failed
fn with_volume<P, F>(fs: &mut TinyFs<P>, volume: &VolumeArgs, f: F) -> anyhow::Result<()>
where
    P: DiskProvider,
    F: FnOnce(&mut TinyFs<P>) -> anyhow::Result<()>,
{
    let path = &volume.image_file_path;
    fs.mount(path)
        .with_context(|| format!("failed to mount {path}"))?;
    let result = f(fs);
    fs.unmount()?;
    result
}

/// `open` creates missing files, which a read or a delete must not do
fn open_existing<P: DiskProvider>(fs: &mut TinyFs<P>, name: &str) -> anyhow::Result<FileDescriptor> {
    if !fs.readdir()?.iter().any(|entry| entry == name) {
        bail!("no such file: {name}");
    }
    Ok(fs.open(name)?)
}

fn read_to_end<P: DiskProvider>(fs: &mut TinyFs<P>, fd: FileDescriptor) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    loop {
        match fs.read_byte(fd) {
            Ok(byte) => bytes.push(byte),
            Err(FsError::EndOfFile) => return Ok(bytes),
            Err(e) => return Err(e.into()),
        }
    }
}
