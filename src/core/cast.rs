//! Purpose: The cast store aggregate: ordinary messages plus the optional alert.
//! Exports: `CastStore`.
//! Role: Single unit of persistence behind the `cast` CLI; load, mutate once, save, render.
//! Invariants: Exactly one container is touched per `add_message`/`delete_messages` call.
//! Invariants: `save` replaces the target atomically (uniquely named temp file in the same directory, then rename).
//! Invariants: `render` is pure and derives only from in-memory state.
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::core::error::{Error, ErrorKind};
use crate::core::format;
use crate::core::message::{AlertSlot, Message, MessageSequence};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CastStore {
    messages: MessageSequence,
    alert: AlertSlot,
}

impl CastStore {
    pub fn create_empty() -> Self {
        Self::default()
    }

    /// Reads and parses `path`. A missing file is `NotFound`; malformed content is `Parse`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::io(path, err)
                .with_message(format!("{} does not exist", path.display())),
            io::ErrorKind::InvalidData => Error::new(ErrorKind::Parse)
                .with_message("cast file is not valid UTF-8")
                .with_path(path)
                .with_source(err),
            _ => Error::io(path, err),
        })?;

        let (messages, alert) = format::decode(&text).map_err(|err| err.with_path(path))?;
        debug!(
            path = %path.display(),
            messages = messages.len(),
            alert = alert.is_set(),
            "loaded cast file"
        );
        Ok(Self { messages, alert })
    }

    pub fn add_message(&mut self, text: impl Into<String>, is_alert: bool, exit_on_alert: bool) {
        if is_alert {
            self.alert.set(text, exit_on_alert);
        } else {
            self.messages.append(text);
        }
    }

    /// Returns the number of entries actually removed; removing nothing is not an error.
    pub fn delete_messages(&mut self, count: usize, is_alert: bool) -> usize {
        if is_alert {
            self.alert.clear(count)
        } else {
            self.messages.delete_oldest(count)
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let encoded = format::encode(&self.messages, &self.alert);

        // Unique temp name per save; dropped (and removed) on every error path.
        let mut temp = NamedTempFile::new_in(dir).map_err(|err| {
            Error::io(dir, err).with_message("failed to create temporary cast file")
        })?;
        temp.write_all(encoded.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|err| Error::io(path, err).with_message("failed to write cast file"))?;
        temp.persist(path).map_err(|err| {
            Error::io(path, err.error).with_message("failed to replace cast file")
        })?;

        debug!(
            path = %path.display(),
            bytes = encoded.len(),
            "saved cast file"
        );
        Ok(())
    }

    pub fn render(&self) -> String {
        format::encode(&self.messages, &self.alert)
    }

    pub fn messages(&self) -> &MessageSequence {
        &self.messages
    }

    pub fn alert(&self) -> Option<&Message> {
        self.alert.get()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && !self.alert.is_set()
    }
}

#[cfg(test)]
mod tests {
    use super::CastStore;
    use crate::core::error::ErrorKind;
    use crate::core::message::Message;

    fn store_with(texts: &[&str]) -> CastStore {
        let mut store = CastStore::create_empty();
        for text in texts {
            store.add_message(*text, false, false);
        }
        store
    }

    #[test]
    fn create_empty_has_nothing() {
        let store = CastStore::create_empty();
        assert!(store.is_empty());
        assert!(store.messages().is_empty());
        assert!(store.alert().is_none());
        assert_eq!(store.render(), "");
    }

    #[test]
    fn render_lists_messages_in_append_order() {
        let store = store_with(&["one", "two", "three"]);
        assert_eq!(store.render(), "[Messages]\n1: one\n2: two\n3: three\n");
    }

    #[test]
    fn add_message_touches_only_one_container() {
        let mut store = store_with(&["a"]);
        store.add_message("Down!", true, true);
        assert_eq!(store.messages().texts(), vec!["a"]);
        assert_eq!(store.alert(), Some(&Message::alert("Down!", true)));

        store.add_message("b", false, true);
        assert_eq!(store.messages().texts(), vec!["a", "b"]);
        assert_eq!(store.alert(), Some(&Message::alert("Down!", true)));
    }

    #[test]
    fn new_alert_replaces_old_alert() {
        let mut store = CastStore::create_empty();
        store.add_message("Down!", true, true);
        store.add_message("Up", true, false);
        assert_eq!(store.alert(), Some(&Message::alert("Up", false)));
        assert!(!store.render().contains("Down!"));
    }

    #[test]
    fn delete_messages_clamps_to_available() {
        let mut store = store_with(&["a", "b"]);
        assert_eq!(store.delete_messages(5, false), 2);
        assert!(store.messages().is_empty());
        assert_eq!(store.delete_messages(1, false), 0);
    }

    #[test]
    fn delete_messages_removes_oldest_first() {
        let mut store = store_with(&["a", "b", "c"]);
        assert_eq!(store.delete_messages(2, false), 2);
        assert_eq!(store.messages().texts(), vec!["c"]);
    }

    #[test]
    fn delete_alert_ignores_count() {
        let mut store = store_with(&["a"]);
        assert_eq!(store.delete_messages(3, true), 0);

        store.add_message("Down!", true, false);
        assert_eq!(store.delete_messages(3, true), 1);
        assert!(store.alert().is_none());
        assert_eq!(store.messages().texts(), vec!["a"]);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("demo.cast");

        let mut store = store_with(&["first", "  spaced  ", "multi\nline", ""]);
        store.add_message("Down!", true, true);
        store.save(&path).expect("save");

        let loaded = CastStore::load(&path).expect("load");
        assert_eq!(loaded, store);
    }

    #[test]
    fn alert_only_store_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("alert.cast");

        let mut store = CastStore::create_empty();
        store.add_message("Maintenance at noon", true, false);
        store.save(&path).expect("save");

        let text = std::fs::read_to_string(&path).expect("read");
        assert_eq!(text, "[AlertMessage]\nmessage: Maintenance at noon\nexit: false\n");

        let loaded = CastStore::load(&path).expect("load");
        assert_eq!(loaded, store);
        assert!(loaded.messages().is_empty());
        assert_eq!(loaded.alert(), Some(&Message::alert("Maintenance at noon", false)));
    }

    #[test]
    fn overlapping_saves_to_one_path_all_succeed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("busy.cast");

        let first = store_with(&["from first"; 500]);
        let second = store_with(&["from second"; 500]);
        std::thread::scope(|scope| {
            for store in [&first, &second] {
                let path = &path;
                scope.spawn(move || {
                    for _ in 0..50 {
                        store.save(path).expect("save");
                    }
                });
            }
        });

        let loaded = CastStore::load(&path).expect("load");
        assert!(loaded == first || loaded == second);
        let entries = std::fs::read_dir(dir.path()).expect("read_dir").count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn hello_scenario_renders_single_message() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hello.cast");

        let mut store = CastStore::create_empty();
        store.add_message("Hello", false, false);
        store.save(&path).expect("save");

        let loaded = CastStore::load(&path).expect("load");
        assert_eq!(loaded.render(), "[Messages]\n1: Hello\n");
        assert!(loaded.alert().is_none());
    }

    #[test]
    fn save_overwrites_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("demo.cast");

        store_with(&["a", "b", "c"]).save(&path).expect("save");
        store_with(&["z"]).save(&path).expect("save again");

        let loaded = CastStore::load(&path).expect("load");
        assert_eq!(loaded.messages().texts(), vec!["z"]);

        let entries = std::fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect::<Vec<_>>();
        assert_eq!(entries, vec![std::ffi::OsString::from("demo.cast")]);
    }

    #[test]
    fn save_into_missing_directory_fails_and_keeps_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("demo.cast");

        let err = store_with(&["a"]).save(&path).expect_err("save should fail");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!path.exists());
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.cast");

        let err = CastStore::load(&path).expect_err("load should fail");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[test]
    fn load_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.cast");
        std::fs::write(&path, "[Messages]\n1: fine\nnot an entry\n").expect("write");

        let err = CastStore::load(&path).expect_err("load should fail");
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[test]
    fn load_non_utf8_file_is_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("binary.cast");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).expect("write");

        let err = CastStore::load(&path).expect_err("load should fail");
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
