// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

//! Writers for small checkpoint archives used in tests

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_yaml::Value;

/// Minimal protocol 2 pickle writer
#[derive(Debug, Clone)]
pub struct Pickle(Vec<u8>);

impl Default for Pickle {
    fn default() -> Self {
        Pickle::new()
    }
}

impl Pickle {
    pub fn new() -> Self {
        Pickle(vec![0x80, 0x02])
    }

    pub fn op(mut self, op: u8) -> Self {
        self.0.push(op);
        self
    }

    pub fn string(mut self, s: &str) -> Self {
        self.0.push(b'X');
        self.0.extend((s.len() as u32).to_le_bytes());
        self.0.extend(s.as_bytes());
        self
    }

    pub fn int(mut self, i: i32) -> Self {
        self.0.push(b'J');
        self.0.extend(i.to_le_bytes());
        self
    }

    pub fn float(mut self, f: f64) -> Self {
        self.0.push(b'G');
        self.0.extend(f.to_be_bytes());
        self
    }

    pub fn dict(self) -> Self {
        self.op(b'}')
    }

    pub fn mark(self) -> Self {
        self.op(b'(')
    }

    pub fn set_items(self) -> Self {
        self.op(b'u')
    }

    /// Push a yaml value as the equivalent python object
    pub fn value(self, value: &Value) -> Self {
        match value {
            Value::Bool(true) => self.op(0x88),
            Value::Bool(false) => self.op(0x89),
            Value::Number(n) => match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
                Some(i) => self.int(i),
                None => self.float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => self.string(s),
            Value::Sequence(items) if !items.is_empty() => items
                .iter()
                .fold(self.op(b']').mark(), |pickle, item| pickle.value(item))
                .op(b'e'),
            Value::Sequence(_) => self.op(b']'),
            Value::Mapping(mapping) if !mapping.is_empty() => mapping
                .iter()
                .fold(self.dict().mark(), |pickle, (k, v)| pickle.value(k).value(v))
                .set_items(),
            Value::Mapping(_) => self.dict(),
            Value::Null | Value::Tagged(_) => self.op(b'N'),
        }
    }

    pub fn stop(self) -> Vec<u8> {
        self.op(b'.').0
    }
}

/// Write a zip archive holding `pickle` as its `data.pkl` entry
pub fn write_archive(path: &Path, pickle: &[u8]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    writer.start_file("archive/data.pkl", options).unwrap();
    writer.write_all(pickle).unwrap();
    writer.start_file("archive/version", options).unwrap();
    writer.write_all(b"3\n").unwrap();
    writer.finish().unwrap();
}

/// Write a checkpoint with an empty `model` entry and optional `params`
pub fn write_checkpoint(path: &Path, params: Option<&Value>) {
    let mut pickle = Pickle::new().dict().mark().string("model").dict();

    if let Some(params) = params {
        pickle = pickle.string("params").value(params);
    }

    write_archive(path, &pickle.set_items().stop());
}
