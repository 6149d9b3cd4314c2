//! Очки и high-score persistence
//!
//! Score — счёт текущего раунда (сбрасывается на входе в Playing).
//! HighScores — top-N таблица (score + дата, по убыванию), читается один
//! раз на старте и пишется на game-over. Носитель — за trait'ом
//! ScoreStore; ошибки persistence логируются и НИКОГДА не влияют на
//! геймплей.

use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logger;

/// Сколько записей держим в таблице
pub const MAX_ENTRIES: usize = 10;

/// Счёт текущего раунда
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct Score {
    pub points: u32,
    pub kills: u32,
}

impl Score {
    pub fn reset(&mut self) {
        *self = Score::default();
    }
}

/// Одна запись таблицы рекордов
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub score: u32,
    /// Дата игры, "YYYY-MM-DD"
    pub date: String,
}

/// Top-N таблица рекордов, по убыванию score
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<ScoreEntry>,
}

impl HighScores {
    /// true если score попал бы в таблицу
    pub fn qualifies(&self, score: u32) -> bool {
        if self.entries.len() < MAX_ENTRIES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Вставляет запись с сохранением порядка; true если запись осталась
    /// в top-N. При равном счёте новая запись идёт ниже старых.
    pub fn submit(&mut self, score: u32, date: String) -> bool {
        let position = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        if position >= MAX_ENTRIES {
            return false;
        }

        self.entries.insert(position, ScoreEntry { score, date });
        self.entries.truncate(MAX_ENTRIES);
        true
    }
}

#[derive(Debug, Error)]
pub enum ScoreStoreError {
    #[error("score storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("score storage format: {0}")]
    Format(#[from] serde_json::Error),
}

/// Носитель таблицы рекордов (consumed interface)
pub trait ScoreStore: Send + Sync {
    fn load(&self) -> Result<HighScores, ScoreStoreError>;
    fn save(&self, scores: &HighScores) -> Result<(), ScoreStoreError>;
}

/// JSON-файл на диске
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ScoreStore for JsonFileStore {
    fn load(&self) -> Result<HighScores, ScoreStoreError> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, scores: &HighScores) -> Result<(), ScoreStoreError> {
        let raw = serde_json::to_string_pretty(scores)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// Resource: таблица + её носитель (None в headless-тестах)
#[derive(Resource)]
pub struct HighScoreTable {
    pub scores: HighScores,
    store: Option<Box<dyn ScoreStore>>,
}

impl HighScoreTable {
    pub fn new(store: Option<Box<dyn ScoreStore>>) -> Self {
        Self {
            scores: HighScores::default(),
            store,
        }
    }

    /// Запись раунда + сохранение; ошибки носителя логируются и глотаются
    pub fn submit_and_save(&mut self, score: u32) {
        let date = chrono::Local::now().format("%Y-%m-%d").to_string();
        let kept = self.scores.submit(score, date);
        if kept {
            logger::log_info(&format!("High score submitted: {}", score));
        }

        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(err) = store.save(&self.scores) {
            logger::log_error(&format!("High score save failed: {} (skipped)", err));
        }
    }
}

/// Startup: читаем таблицу с носителя; отсутствие файла — первый запуск
pub fn load_high_scores(mut table: ResMut<HighScoreTable>) {
    let Some(result) = table.store.as_ref().map(|s| s.load()) else {
        return;
    };
    match result {
        Ok(scores) => {
            logger::log_info(&format!("High scores loaded: {} entries", scores.entries.len()));
            table.scores = scores;
        }
        Err(ScoreStoreError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            logger::log_info("No high score file yet, starting empty");
        }
        Err(err) => {
            logger::log_warning(&format!("High score load failed: {} (starting empty)", err));
        }
    }
}

/// Plugin: по умолчанию без носителя; host задаёт путь через with_store_path
#[derive(Default)]
pub struct ScoreboardPlugin {
    pub store_path: Option<PathBuf>,
}

impl ScoreboardPlugin {
    pub fn with_store_path(path: impl AsRef<Path>) -> Self {
        Self {
            store_path: Some(path.as_ref().to_path_buf()),
        }
    }
}

impl Plugin for ScoreboardPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Score>();

        // Host мог вставить свою таблицу (свой носитель) до плагина
        if !app.world().contains_resource::<HighScoreTable>() {
            let store: Option<Box<dyn ScoreStore>> = self
                .store_path
                .as_ref()
                .map(|path| Box::new(JsonFileStore::new(path)) as Box<dyn ScoreStore>);
            app.insert_resource(HighScoreTable::new(store));
        }

        app.add_systems(Startup, load_high_scores);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(score: u32) -> ScoreEntry {
        ScoreEntry {
            score,
            date: "2026-01-01".to_string(),
        }
    }

    #[test]
    fn test_submit_keeps_descending_order() {
        let mut scores = HighScores::default();
        scores.submit(100, "d".into());
        scores.submit(300, "d".into());
        scores.submit(200, "d".into());

        let values: Vec<u32> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(values, vec![300, 200, 100]);
    }

    #[test]
    fn test_table_truncates_to_max() {
        let mut scores = HighScores::default();
        for i in 0..(MAX_ENTRIES as u32 + 5) {
            scores.submit(i * 10, "d".into());
        }
        assert_eq!(scores.entries.len(), MAX_ENTRIES);

        // Низший счёт не попадает
        assert!(!scores.submit(0, "d".into()));
        assert_eq!(scores.entries.len(), MAX_ENTRIES);
    }

    #[test]
    fn test_qualifies() {
        let mut scores = HighScores::default();
        assert!(scores.qualifies(0)); // Таблица не полна

        scores.entries = (0..MAX_ENTRIES as u32).rev().map(|i| entry(i * 10)).collect();
        assert!(scores.qualifies(1000));
        assert!(!scores.qualifies(0));
    }

    #[test]
    fn test_equal_scores_keep_older_first() {
        let mut scores = HighScores::default();
        scores.submit(100, "first".into());
        scores.submit(100, "second".into());

        assert_eq!(scores.entries[0].date, "first");
        assert_eq!(scores.entries[1].date, "second");
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let path = std::env::temp_dir().join("ashrun_scores_test.json");
        let store = JsonFileStore::new(&path);

        let mut scores = HighScores::default();
        scores.submit(420, "2026-02-02".into());
        store.save(&scores).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, scores);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let store = JsonFileStore::new("/definitely/not/here/scores.json");
        assert!(matches!(store.load(), Err(ScoreStoreError::Io(_))));
    }

    #[test]
    fn test_submit_and_save_without_store_is_ok() {
        let mut table = HighScoreTable::new(None);
        table.submit_and_save(50);
        assert_eq!(table.scores.entries.len(), 1);
    }
}
