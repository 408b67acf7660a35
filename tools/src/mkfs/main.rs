use bincode::serialize;
use lazy_static::lazy_static;
use serde::Serialize;

use std::{
    env, fmt,
    fs::{self, File, OpenOptions},
    os::unix::prelude::FileExt,
    path::Path,
    process,
    sync::Mutex,
};

mod defs;
use defs::*;

lazy_static! {
    static ref FILE: Mutex<File> = {
        let args: Vec<_> = env::args().collect();
        let path = &args[1];
        let file = open_file(path);
        Mutex::new(file)
    };
}

/// File to be placed in the image
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub file_type: FileType,
    pub data: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: &str, file_type: FileType, data: Vec<u8>) -> Self {
        ImageFile {
            name: name.to_string(),
            file_type,
            data,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum MkfsError {
    TooManyFiles(usize),
    NameTooLong(String),
    FileTooLarge(String, usize),
}

impl fmt::Display for MkfsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MkfsError::TooManyFiles(count) => write!(
                f,
                "{} files do not fit in a directory of {} entries",
                count, MAX_DIRECTORY_ENTRIES
            ),
            MkfsError::NameTooLong(name) => {
                write!(f, "File name {} is longer than {} bytes", name, FILE_NAME_LENGTH)
            }
            MkfsError::FileTooLarge(name, size) => write!(
                f,
                "File {} has {} bytes, at most {} fit in one inode",
                name, size, MAX_FILE_SIZE
            ),
        }
    }
}

fn blocks_for(length: usize) -> usize {
    (length + BLOCK_SIZE - 1) / BLOCK_SIZE
}

fn put<T: Serialize>(image: &mut [u8], offset: usize, value: &T) {
    let serialized = serialize(value).expect("Failed to serialize image structure");
    image[offset..offset + serialized.len()].copy_from_slice(&serialized);
}

/// Lays out the boot block, one inode block per regular file, then the data blocks. Entries
/// that are not regular files point at inode 0 and own no data.
pub fn build_image(files: &[ImageFile]) -> Result<Vec<u8>, MkfsError> {
    if files.len() > MAX_DIRECTORY_ENTRIES {
        return Err(MkfsError::TooManyFiles(files.len()));
    }

    for file in files {
        if file.name.len() > FILE_NAME_LENGTH {
            return Err(MkfsError::NameTooLong(file.name.clone()));
        }
        if file.data.len() > MAX_FILE_SIZE {
            return Err(MkfsError::FileTooLarge(file.name.clone(), file.data.len()));
        }
    }

    let regular: Vec<&ImageFile> = files
        .iter()
        .filter(|file| file.file_type == FileType::Regular)
        .collect();
    let header = BootHeader {
        directory_count: files.len() as u32,
        inode_count: regular.len() as u32,
        data_block_count: regular.iter().map(|file| blocks_for(file.data.len())).sum::<usize>()
            as u32,
    };

    let total_blocks = 1 + header.inode_count as usize + header.data_block_count as usize;
    let mut image = vec![0u8; total_blocks * BLOCK_SIZE];
    put(&mut image, 0, &header);

    let mut next_inode = 0;
    let mut next_data_block = 0;
    for (index, file) in files.iter().enumerate() {
        let mut entry = DirectoryEntry {
            file_type: file.file_type as u32,
            ..Default::default()
        };
        entry.name[..file.name.len()].copy_from_slice(file.name.as_bytes());

        if file.file_type == FileType::Regular {
            entry.inode = next_inode;

            let inode_base = (1 + next_inode as usize) * BLOCK_SIZE;
            put(&mut image, inode_base, &(file.data.len() as u32));
            for (position, chunk) in file.data.chunks(BLOCK_SIZE).enumerate() {
                put(&mut image, inode_base + 4 + position * 4, &(next_data_block as u32));

                let start = (1 + header.inode_count as usize + next_data_block) * BLOCK_SIZE;
                image[start..start + chunk.len()].copy_from_slice(chunk);
                next_data_block += 1;
            }

            next_inode += 1;
        }

        put(&mut image, BOOT_HEADER_SIZE + index * DIRECTORY_ENTRY_SIZE, &entry);
    }

    Ok(image)
}

/// The directory itself and the clock come first, then every file of `path` by name
fn collect_files(path: &str) -> Vec<ImageFile> {
    let mut files = vec![
        ImageFile::new(".", FileType::Directory, Vec::new()),
        ImageFile::new(RTC_NAME, FileType::Rtc, Vec::new()),
    ];

    let mut entries: Vec<_> = fs::read_dir(path)
        .expect("Failed to read input directory")
        .map(|entry| entry.expect("Failed to read directory entry").path())
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    for entry in entries {
        let name = entry
            .file_name()
            .and_then(|name| name.to_str())
            .expect("File names must be valid UTF-8");
        let data = fs::read(&entry).expect("Failed to read file");
        files.push(ImageFile::new(name, FileType::Regular, data));
    }

    files
}

fn write_sector(sector: usize, data: &[u8]) {
    let file = FILE.lock().unwrap();

    file.write_all_at(data, (BLOCK_SIZE * sector) as u64)
        .expect("Failed to write image");
}

fn open_file(path: &String) -> File {
    // Delete if file already exists
    let path = Path::new(path);
    if path.exists() {
        fs::remove_file(path).expect("Could not delete file");
    }

    return OpenOptions::new()
        .write(true)
        .create(true)
        .read(true)
        .open(path)
        .expect("Failed to open image file");
}

fn main() {
    let args: Vec<_> = env::args().collect();
    if args.len() < 3 {
        eprintln!("mkfs requires 2 arguments, image of the file system and directory of files...");
        process::exit(1);
    }

    let files = collect_files(&args[2]);
    let image = match build_image(&files) {
        Ok(image) => image,
        Err(error) => {
            eprintln!("[MKFS] {}", error);
            process::exit(1);
        }
    };

    for (sector, block) in image.chunks(BLOCK_SIZE).enumerate() {
        write_sector(sector, block);
    }

    println!(
        "[MKFS] Wrote {} files in {} blocks",
        files.len(),
        image.len() / BLOCK_SIZE
    );
}
