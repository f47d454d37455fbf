//! Host section discovery.
//!
//! One subdirectory per host under the base directory. The info blurb is
//! raw Latin-1 text; images are the host's `*.png` files in lexicographic
//! filename order. Discovery happens once per run; the result is immutable.

use std::fs;
use std::path::{Path, PathBuf};

use super::ReportError;

const INFO_FILE: &str = "info.txt";

/// One host's slice of the report.
#[derive(Debug, Clone)]
pub struct HostSection {
    /// Display counter. Assigned per discovered host directory, so skipped
    /// hosts leave an intentional gap in the numbering.
    pub number: usize,
    pub name: String,
    pub info: String,
    pub images: Vec<PathBuf>,
}

/// Decode Latin-1 bytes; every byte maps to the code point of equal value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Scan the base directory for host sections, in host-name sort order.
///
/// A host directory without an info file is skipped with a diagnostic; its
/// counter value is not reused.
pub fn scan_base_dir(base: &Path) -> Result<Vec<HostSection>, ReportError> {
    let mut host_dirs: Vec<PathBuf> = fs::read_dir(base)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    host_dirs.sort();

    let mut sections = Vec::with_capacity(host_dirs.len());
    for (index, dir) in host_dirs.iter().enumerate() {
        let number = index + 1;
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let info_path = dir.join(INFO_FILE);
        let info = match fs::read(&info_path) {
            Ok(bytes) => decode_latin1(&bytes),
            Err(err) => {
                tracing::warn!(
                    "skipping host {} (no {}): {}",
                    name,
                    info_path.display(),
                    err
                );
                continue;
            }
        };

        let mut images: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .map(|ext| ext == "png")
                        .unwrap_or(false)
            })
            .collect();
        images.sort();

        sections.push(HostSection {
            number,
            name,
            info,
            images,
        });
    }
    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn make_host(base: &Path, name: &str, info: Option<&[u8]>, images: &[&str]) {
        let dir = base.join(name);
        fs::create_dir(&dir).unwrap();
        if let Some(bytes) = info {
            File::create(dir.join(INFO_FILE))
                .unwrap()
                .write_all(bytes)
                .unwrap();
        }
        for image in images {
            File::create(dir.join(image)).unwrap();
        }
    }

    #[test]
    fn test_hosts_sorted_and_numbered() {
        let tmp = tempfile::tempdir().unwrap();
        make_host(tmp.path(), "web02", Some(b"second"), &[]);
        make_host(tmp.path(), "db01", Some(b"first"), &[]);

        let sections = scan_base_dir(tmp.path()).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "db01");
        assert_eq!(sections[0].number, 1);
        assert_eq!(sections[1].name, "web02");
        assert_eq!(sections[1].number, 2);
    }

    #[test]
    fn test_missing_info_skips_host_but_keeps_numbering() {
        let tmp = tempfile::tempdir().unwrap();
        make_host(tmp.path(), "a-host", Some(b"kept"), &[]);
        make_host(tmp.path(), "b-host", None, &[]);
        make_host(tmp.path(), "c-host", Some(b"also kept"), &[]);

        let sections = scan_base_dir(tmp.path()).unwrap();
        let numbers: Vec<(usize, &str)> = sections
            .iter()
            .map(|s| (s.number, s.name.as_str()))
            .collect();
        assert_eq!(numbers, vec![(1, "a-host"), (3, "c-host")]);
    }

    #[test]
    fn test_images_sorted_and_filtered() {
        let tmp = tempfile::tempdir().unwrap();
        make_host(
            tmp.path(),
            "web01",
            Some(b"info"),
            &["graph_2.png", "graph_1.png", "notes.txt", "raw.jpeg"],
        );
        let sections = scan_base_dir(tmp.path()).unwrap();
        let names: Vec<String> = sections[0]
            .images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["graph_1.png", "graph_2.png"]);
    }

    #[test]
    fn test_latin1_decoding() {
        let tmp = tempfile::tempdir().unwrap();
        // "rèseau" with a Latin-1 e-grave (0xE8)
        make_host(tmp.path(), "fr01", Some(&[b'r', 0xE8, b's', b'e', b'a', b'u']), &[]);
        let sections = scan_base_dir(tmp.path()).unwrap();
        assert_eq!(sections[0].info, "rèseau");
    }

    #[test]
    fn test_plain_files_in_base_dir_are_not_hosts() {
        let tmp = tempfile::tempdir().unwrap();
        File::create(tmp.path().join("README")).unwrap();
        make_host(tmp.path(), "web01", Some(b"x"), &[]);
        let sections = scan_base_dir(tmp.path()).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].number, 1);
    }
}
