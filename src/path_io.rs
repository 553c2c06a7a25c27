use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{PathError, Result};
use crate::parsing::wordlist_parser::{parse_item_text, parse_mapping_text};
use crate::types::path_data::PathResult;
use crate::vocabulary::{items_from_map, ItemVocabulary, VocabularyMapping};

fn is_txt(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

/// Reads any serde value from a JSON file.
pub fn read_json<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let file = File::open(file_path).map_err(|e| PathError::io(file_path, e))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| PathError::Json { path: file_path.to_path_buf(), source })
}

/// Writes `value` as pretty JSON, replacing the file if it exists.
pub fn write_json<T: Serialize>(value: &T, file_path: &Path) -> Result<()> {
    let file = File::create(file_path).map_err(|e| PathError::io(file_path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|source| PathError::Json { path: file_path.to_path_buf(), source })?;
    writer.flush().map_err(|e| PathError::io(file_path, e))
}

pub fn save_path_result(result: &PathResult, file_path: &Path) -> Result<()> {
    write_json(result, file_path)?;
    info!("Saved reading path ({} items) to {:?}", result.total_items(), file_path);
    Ok(())
}

pub fn load_path_result(file_path: &Path) -> Result<PathResult> {
    read_json(file_path)
}

/// Loads item vocabularies from either a JSON object (`id -> [words]`) or a
/// directory holding one `<id>.txt` word list per item.
pub fn load_items(path: &Path) -> Result<Vec<ItemVocabulary>> {
    let items = if path.is_dir() {
        load_item_dir(path)?
    } else {
        let table: BTreeMap<String, Vec<String>> = read_json(path)?;
        items_from_map(table)
    };
    let empty = items.iter().filter(|i| i.is_empty()).count();
    if empty > 0 {
        warn!("{} of {} items in {:?} have no words.", empty, items.len(), path);
    }
    info!("Loaded {} items from {:?}", items.len(), path);
    Ok(items)
}

fn load_item_dir(dir: &Path) -> Result<Vec<ItemVocabulary>> {
    let entries = fs::read_dir(dir).map_err(|e| PathError::io(dir, e))?;
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PathError::io(dir, e))?;
        let file_path = entry.path();
        if file_path.is_file() && is_txt(&file_path) {
            files.push(file_path);
        }
    }
    files.sort();

    let mut items = Vec::with_capacity(files.len());
    for file_path in files {
        let Some(id) = file_path.file_stem().and_then(|s| s.to_str()) else {
            warn!("Skipping item file with a non UTF-8 name: {:?}", file_path);
            continue;
        };
        let content = fs::read_to_string(&file_path).map_err(|e| PathError::io(&file_path, e))?;
        items.push(parse_item_text(id, &content));
    }
    Ok(items)
}

/// Loads the word -> level mapping from a `.txt` word list or a JSON object.
pub fn load_mapping(path: &Path) -> Result<VocabularyMapping> {
    let mapping = if is_txt(path) {
        let content = fs::read_to_string(path).map_err(|e| PathError::io(path, e))?;
        parse_mapping_text(&path.display().to_string(), &content)
    } else {
        let table: BTreeMap<String, String> = read_json(path)?;
        table.into_iter().collect()
    };
    info!("Loaded {} mapped words from {:?}", mapping.len(), path);
    Ok(mapping)
}
