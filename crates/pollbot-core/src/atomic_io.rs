use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writes text using a temp file + rename so readers never observe partial data.
///
/// The temp file lives next to `path` so the final rename stays on one
/// filesystem. A failed rename removes the temp file again.
pub fn write_text_atomic(path: &Path, content: &str) -> io::Result<()> {
    if path.as_os_str().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "destination path cannot be empty",
        ));
    }
    if path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("destination path '{}' is a directory", path.display()),
        ));
    }

    let parent_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent_dir)?;

    let temp_path = temp_path_for(parent_dir, path);
    let written = File::create(&temp_path).and_then(|mut file| {
        file.write_all(content.as_bytes())?;
        file.sync_all()
    });
    if let Err(error) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(error);
    }
    if let Err(error) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(parent_dir: &Path, path: &Path) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    parent_dir.join(format!(
        ".{}.tmp-{}-{nanos}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("state"),
        std::process::id(),
    ))
}

#[cfg(test)]
mod tests {
    use super::write_text_atomic;

    #[test]
    fn write_text_atomic_creates_parent_and_replaces_content() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("sample.json");

        write_text_atomic(&path, "first").expect("first write");
        write_text_atomic(&path, "second").expect("second write");

        assert_eq!(std::fs::read_to_string(&path).expect("read"), "second");
    }

    #[test]
    fn write_text_atomic_leaves_no_temp_files_behind() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("poll-state.json");
        write_text_atomic(&path, "{}").expect("write");

        let names = std::fs::read_dir(temp.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect::<Vec<_>>();
        assert_eq!(names, vec![std::ffi::OsString::from("poll-state.json")]);
    }

    #[test]
    fn write_text_atomic_rejects_directory_destination() {
        let temp = tempfile::tempdir().expect("tempdir");
        let error = write_text_atomic(temp.path(), "x").expect_err("directory must fail");
        assert_eq!(error.kind(), std::io::ErrorKind::InvalidInput);
    }
}
