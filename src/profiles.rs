use std::fs;
use std::path::{Path, PathBuf};

/// One enrolled sample per user, keyed by filename. Last enrollment wins.
pub(crate) struct VoiceprintStore {
    dir: PathBuf,
}

impl VoiceprintStore {
    pub(crate) fn new(dir: PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{}.webm", sanitize_user_id(user_id)))
    }

    /// Write to a temporary sibling, then rename. A crash mid-write never
    /// leaves a truncated profile under the final name.
    pub(crate) fn save(&self, user_id: &str, audio: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.path_for(user_id);
        let tmp = tmp_path(&path);
        fs::write(&tmp, audio)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub(crate) fn load(&self, user_id: &str) -> Option<Vec<u8>> {
        fs::read(self.path_for(user_id)).ok()
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

/// User ids come straight off the query string and become filenames.
/// Anything outside [A-Za-z0-9._-] is replaced so a crafted id cannot
/// escape the voiceprint directory.
pub(crate) fn sanitize_user_id(user_id: &str) -> String {
    let cleaned: String = user_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('.').to_string();
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> (VoiceprintStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("voxgate-vp-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        (VoiceprintStore::new(dir.clone()).unwrap(), dir)
    }

    #[test]
    fn save_then_load_roundtrip() {
        let (store, dir) = temp_store("roundtrip");
        store.save("alice", b"enrolled-audio").unwrap();
        assert_eq!(store.load("alice").unwrap(), b"enrolled-audio");
        assert!(store.load("bob").is_none());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn second_enrollment_overwrites_first() {
        let (store, dir) = temp_store("overwrite");
        store.save("alice", b"first").unwrap();
        store.save("alice", b"second").unwrap();
        assert_eq!(store.load("alice").unwrap(), b"second");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn save_leaves_no_tmp_residue() {
        let (store, dir) = temp_store("tmp");
        store.save("alice", b"audio").unwrap();
        let leftovers: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn sanitize_strips_path_separators() {
        assert_eq!(sanitize_user_id("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_user_id("alice"), "alice");
        assert_eq!(sanitize_user_id("a b/c"), "a_b_c");
        assert_eq!(sanitize_user_id(""), "_");
    }

    #[test]
    fn traversal_id_stays_inside_dir() {
        let (store, dir) = temp_store("traversal");
        store.save("../escape", b"audio").unwrap();
        let entries: Vec<_> = fs::read_dir(&dir).unwrap().filter_map(|e| e.ok()).collect();
        assert_eq!(entries.len(), 1);
        assert!(store.load("../escape").is_some());
        let _ = fs::remove_dir_all(dir);
    }
}
