use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use super::*;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, ()> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned().ok_or(())
}

#[test]
fn defaults_when_nothing_is_set() {
    let config = EditorConfig::from_lookup(lookup(&[]));
    assert_eq!(config, EditorConfig::default());
    assert_eq!(config.flip_duration, Duration::from_millis(600));
    assert_eq!(config.undo_limit, 50);
}

#[test]
fn parses_every_knob() {
    let config = EditorConfig::from_lookup(lookup(&[
        ("SCRAPBOOK_FLIP_MS", "250"),
        ("SCRAPBOOK_CROP_PAN_SENSITIVITY", "0.5"),
        ("SCRAPBOOK_UNDO_LIMIT", "3"),
        ("SCRAPBOOK_DEFAULT_ITEM_SIZE", "150"),
    ]));
    assert_eq!(config.flip_duration, Duration::from_millis(250));
    assert!((config.crop_pan_sensitivity - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.undo_limit, 3);
    assert!((config.default_item_size - 150.0).abs() < f64::EPSILON);
}

#[test]
fn invalid_values_fall_back_to_defaults() {
    let config = EditorConfig::from_lookup(lookup(&[
        ("SCRAPBOOK_FLIP_MS", "soon"),
        ("SCRAPBOOK_UNDO_LIMIT", "-1"),
        ("SCRAPBOOK_CROP_PAN_SENSITIVITY", "NaN"),
    ]));
    assert_eq!(config.flip_duration, Duration::from_millis(600));
    assert_eq!(config.undo_limit, 50);
    assert!((config.crop_pan_sensitivity - 1.0).abs() < f64::EPSILON);
}

#[test]
fn default_item_size_never_below_min_size() {
    let config = EditorConfig::from_lookup(lookup(&[("SCRAPBOOK_DEFAULT_ITEM_SIZE", "5")]));
    assert!((config.default_item_size - MIN_SIZE).abs() < f64::EPSILON);
}

#[test]
fn env_parse_uses_default_for_missing_key() {
    assert_eq!(env_parse("SCRAPBOOK_TEST_KEY_THAT_IS_NEVER_SET", 7_u32), 7);
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn invalid_value_is_logged_with_its_key() {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        EditorConfig::from_lookup(lookup(&[("SCRAPBOOK_FLIP_MS", "soon"), ("SCRAPBOOK_UNDO_LIMIT", "3")]));
    });

    let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("SCRAPBOOK_FLIP_MS"), "{logs}");
    assert!(logs.contains("soon"), "{logs}");
    assert!(!logs.contains("SCRAPBOOK_UNDO_LIMIT"), "{logs}");
}
