use super::error::FakeError;
use crate::hal::storage::{File, FileName, Storage};
use std::{
    cell::RefCell,
    rc::Rc,
    string::{String, ToString},
    vec::Vec,
};

type Contents = Rc<RefCell<Vec<u8>>>;

struct Entry {
    path: String,
    contents: Contents,
}

/// Flat in-memory filesystem. Directories exist once created, and files
/// live under `directory/name` paths.
#[derive(Default)]
pub struct FakeStorage {
    entries: Vec<Entry>,
    directories: Vec<String>,
    /// Number of upcoming mount attempts that will fail.
    pub failing_mounts: u32,
    pub mount_attempts: u32,
    /// Reads from the named file fail when they would go past this offset.
    pub failing_read: Option<(String, usize)>,
    /// Largest chunk a single read returns, to exercise short reads.
    pub read_chunk: Option<usize>,
    pub open_files: usize,
    pub renames: Vec<(String, String)>,
    pub removals: Vec<String>,
    /// Every rename fails while set.
    pub failing_renames: bool,
}

pub struct FakeFile {
    contents: Contents,
    cursor: usize,
    failing_read: Option<usize>,
    read_chunk: Option<usize>,
}

pub struct FakeDirectory {
    names: Vec<FileName>,
    position: usize,
}

impl FakeStorage {
    pub fn new() -> Self { Self::default() }

    pub fn add_directory(&mut self, path: &str) { self.directories.push(path.to_string()); }

    pub fn add_file(&mut self, path: &str, bytes: &[u8]) {
        self.entries.retain(|e| e.path != path);
        self.entries.push(Entry {
            path: path.to_string(),
            contents: Rc::new(RefCell::new(bytes.to_vec())),
        });
    }

    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.find(path).map(|e| e.contents.borrow().clone())
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.contents(path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn exists(&self, path: &str) -> bool { self.find(path).is_some() }

    fn find(&self, path: &str) -> Option<&Entry> { self.entries.iter().find(|e| e.path == path) }

    fn file(&mut self, contents: Contents, path: &str) -> FakeFile {
        self.open_files += 1;
        FakeFile {
            contents,
            cursor: 0,
            failing_read: self
                .failing_read
                .as_ref()
                .filter(|(failing, _)| failing == path)
                .map(|(_, offset)| *offset),
            read_chunk: self.read_chunk,
        }
    }
}

impl Storage for FakeStorage {
    type Error = FakeError;
    type File = FakeFile;
    type Directory = FakeDirectory;

    fn mount(&mut self) -> Result<(), Self::Error> {
        self.mount_attempts += 1;
        if self.failing_mounts > 0 {
            self.failing_mounts -= 1;
            Err(FakeError)
        } else {
            Ok(())
        }
    }

    fn open_directory(&mut self, path: &str) -> Result<Self::Directory, Self::Error> {
        if !self.directories.iter().any(|d| d == path) {
            return Err(FakeError);
        }
        let names = self
            .entries
            .iter()
            .filter_map(|e| e.path.strip_prefix(path)?.strip_prefix('/'))
            .filter(|name| !name.contains('/'))
            .filter_map(|name| FileName::try_from(name).ok())
            .collect();
        Ok(FakeDirectory { names, position: 0 })
    }

    fn next_entry(
        &mut self,
        directory: &mut Self::Directory,
    ) -> Result<Option<FileName>, Self::Error> {
        let entry = directory.names.get(directory.position).cloned();
        directory.position += 1;
        Ok(entry)
    }

    fn open(&mut self, path: &str) -> Result<Self::File, Self::Error> {
        let contents = self.find(path).ok_or(FakeError)?.contents.clone();
        Ok(self.file(contents, path))
    }

    fn create(&mut self, path: &str) -> Result<Self::File, Self::Error> {
        let (directory, _) = path.rsplit_once('/').ok_or(FakeError)?;
        if !self.directories.iter().any(|d| d == directory) {
            return Err(FakeError);
        }
        self.add_file(path, &[]);
        self.open(path)
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), Self::Error> {
        if self.failing_renames || self.exists(to) {
            return Err(FakeError);
        }
        let entry = self.entries.iter_mut().find(|e| e.path == from).ok_or(FakeError)?;
        entry.path = to.to_string();
        self.renames.push((from.to_string(), to.to_string()));
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<(), Self::Error> {
        let position = self.entries.iter().position(|e| e.path == path).ok_or(FakeError)?;
        self.entries.remove(position);
        self.removals.push(path.to_string());
        Ok(())
    }

    fn close(&mut self, _file: Self::File) -> Result<(), Self::Error> {
        self.open_files -= 1;
        Ok(())
    }
}

impl File for FakeFile {
    type Error = FakeError;

    fn size(&self) -> u32 { self.contents.borrow().len() as u32 }

    fn seek(&mut self, offset: u32) -> Result<(), Self::Error> {
        if offset as usize > self.contents.borrow().len() {
            return Err(FakeError);
        }
        self.cursor = offset as usize;
        Ok(())
    }

    fn read(&mut self, bytes: &mut [u8]) -> Result<usize, Self::Error> {
        let contents = self.contents.borrow();
        let mut end = (self.cursor + bytes.len()).min(contents.len());
        if let Some(chunk) = self.read_chunk {
            end = end.min(self.cursor + chunk);
        }
        if let Some(failing) = self.failing_read {
            if end > failing {
                return Err(FakeError);
            }
        }
        let count = end - self.cursor;
        bytes[..count].copy_from_slice(&contents[self.cursor..end]);
        self.cursor = end;
        Ok(count)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Self::Error> {
        let mut contents = self.contents.borrow_mut();
        let end = self.cursor + bytes.len();
        if contents.len() < end {
            contents.resize(end, 0);
        }
        contents[self.cursor..end].copy_from_slice(bytes);
        self.cursor = end;
        Ok(bytes.len())
    }
}
