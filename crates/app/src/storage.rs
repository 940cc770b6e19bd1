//! Container files on disk.
//!
//! A group is stored as `<group>-<index>.ts`, one file per container, with
//! `index` counting from 0. Decoding scans a directory, groups files by name
//! and orders each group by numeric index (so `a-10.ts` follows `a-9.ts`).
//! Files that don't match the pattern are ignored.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

pub const CONTAINER_EXT: &str = "ts";

/// All container files of one group, sorted by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub files: Vec<(u64, PathBuf)>,
}

pub fn container_file_name(group: &str, index: usize) -> String {
    format!("{}-{}.{}", group, index, CONTAINER_EXT)
}

/// Split `<group>-<index>.ts` into its group name and index.
///
/// The group name is everything before the last `-`, so it may itself contain
/// dashes. Returns None for an empty group name or a non-numeric index.
pub fn parse_container_file_name(name: &str) -> Option<(&str, u64)> {
    let stem = name.strip_suffix(CONTAINER_EXT)?.strip_suffix('.')?;
    let (group, index) = stem.rsplit_once('-')?;

    if group.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((group, index.parse().ok()?))
}

/// Write a group's containers into `dir`, creating it if needed.
///
/// Container files left in `dir` by an earlier encode of the same group are
/// removed first; otherwise decoding would append them to the new output.
pub fn write_group(dir: &Path, group: &str, containers: &[Vec<u8>]) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    remove_group(dir, group)?;

    containers
        .iter()
        .enumerate()
        .map(|(index, container)| {
            let path = dir.join(container_file_name(group, index));
            fs::write(&path, container)?;
            debug!(path = %path.display(), bytes = container.len(), "wrote container");
            Ok(path)
        })
        .collect()
}

/// Delete every `<group>-<index>.ts` file in `dir`. Returns how many were
/// removed.
pub fn remove_group(dir: &Path, group: &str) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        if file_name.to_str().and_then(parse_container_file_name).map(|(name, _)| name) == Some(group) {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    if removed > 0 {
        debug!(group, removed, "removed stale containers");
    }
    Ok(removed)
}

/// Find every group in `dir`, sorted by name.
pub fn scan_groups(dir: &Path) -> io::Result<Vec<Group>> {
    let mut groups: BTreeMap<String, Vec<(u64, PathBuf)>> = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some((group, index)) = file_name.to_str().and_then(parse_container_file_name) else {
            continue;
        };
        groups.entry(group.to_string()).or_default().push((index, entry.path()));
    }

    Ok(groups
        .into_iter()
        .map(|(name, mut files)| {
            files.sort();
            Group { name, files }
        })
        .collect())
}

/// Read a group's containers in index order.
pub fn read_group(group: &Group) -> io::Result<Vec<Vec<u8>>> {
    group.files.iter().map(|(_, path)| fs::read(path)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tsframe-storage-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_file_name() {
        assert_eq!(container_file_name("test0", 3), "test0-3.ts");
    }

    #[test]
    fn test_parse_file_name() {
        assert_eq!(parse_container_file_name("test0-3.ts"), Some(("test0", 3)));
        assert_eq!(parse_container_file_name("my-clip-12.ts"), Some(("my-clip", 12)));
        assert_eq!(parse_container_file_name("clip.ts"), None);
        assert_eq!(parse_container_file_name("clip-x.ts"), None);
        assert_eq!(parse_container_file_name("clip-.ts"), None);
        assert_eq!(parse_container_file_name("-1.ts"), None);
        assert_eq!(parse_container_file_name("clip-1.bin"), None);
        assert_eq!(parse_container_file_name("clip-1.ts.bak"), None);
        assert_eq!(parse_container_file_name("clip-1ts"), None);
    }

    #[test]
    fn test_scan_sorts_numerically() {
        let dir = scratch_dir("scan");
        for index in [10, 2, 0, 1, 9] {
            fs::write(dir.join(container_file_name("b", index)), [index as u8]).unwrap();
        }
        fs::write(dir.join(container_file_name("a", 0)), [0xAA]).unwrap();
        fs::write(dir.join("notes.txt"), b"ignored").unwrap();
        fs::create_dir_all(dir.join("c-0.ts")).unwrap();

        let groups = scan_groups(&dir).unwrap();
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let indexes: Vec<u64> = groups[1].files.iter().map(|(i, _)| *i).collect();
        assert_eq!(indexes, vec![0, 1, 2, 9, 10]);
        assert_eq!(read_group(&groups[1]).unwrap(), vec![vec![0], vec![1], vec![2], vec![9], vec![10]]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_then_scan() {
        let dir = scratch_dir("write");
        let out = dir.join("nested");
        let containers = vec![vec![1u8; 4], vec![2u8; 4], vec![3u8; 2]];

        let paths = write_group(&out, "clip", &containers).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths[2].ends_with("clip-2.ts"));

        let groups = scan_groups(&out).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(read_group(&groups[0]).unwrap(), containers);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_rewrite_drops_stale_containers() {
        let dir = scratch_dir("rewrite");
        write_group(&dir, "clip", &[vec![1u8; 4], vec![2u8; 4], vec![3u8; 4]]).unwrap();
        write_group(&dir, "clip-b", &[vec![9u8; 4]]).unwrap();

        write_group(&dir, "clip", &[vec![7u8; 2]]).unwrap();

        let groups = scan_groups(&dir).unwrap();
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["clip", "clip-b"]);
        assert_eq!(read_group(&groups[0]).unwrap(), vec![vec![7u8; 2]]);
        assert_eq!(read_group(&groups[1]).unwrap(), vec![vec![9u8; 4]]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_scan_missing_dir() {
        assert!(scan_groups(Path::new("/nonexistent/tsframe")).is_err());
    }
}
