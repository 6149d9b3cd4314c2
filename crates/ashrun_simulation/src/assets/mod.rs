//! Asset store (consumed interface)
//!
//! Декодирование картинок/звука — снаружи; host регистрирует уже готовые
//! handle'ы. Промах по имени НЕ ошибка: возвращается placeholder /
//! беззвучная заглушка + warning в лог, геймплей не деградирует.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::logger;

/// Opaque handle картинки на стороне renderer'а
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub name: String,
    /// 0 — placeholder (host рисует магенту-квадрат или что умеет)
    pub handle: u64,
}

impl ImageAsset {
    pub fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            handle: 0,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.handle == 0
    }
}

/// Opaque handle звука
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundAsset {
    pub name: String,
    /// 0 — silent stub
    pub handle: u64,
}

impl SoundAsset {
    pub fn silent(name: &str) -> Self {
        Self {
            name: name.to_string(),
            handle: 0,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.handle == 0
    }
}

#[derive(Resource, Debug, Default)]
pub struct AssetStore {
    images: HashMap<String, ImageAsset>,
    sounds: HashMap<String, SoundAsset>,
}

impl AssetStore {
    pub fn register_image(&mut self, name: &str, handle: u64) {
        self.images.insert(
            name.to_string(),
            ImageAsset {
                name: name.to_string(),
                handle,
            },
        );
    }

    pub fn register_sound(&mut self, name: &str, handle: u64) {
        self.sounds.insert(
            name.to_string(),
            SoundAsset {
                name: name.to_string(),
                handle,
            },
        );
    }

    pub fn get_image(&self, name: &str) -> ImageAsset {
        match self.images.get(name) {
            Some(image) => image.clone(),
            None => {
                logger::log_warning(&format!("Missing image asset '{}', using placeholder", name));
                ImageAsset::placeholder(name)
            }
        }
    }

    pub fn get_sound(&self, name: &str) -> SoundAsset {
        match self.sounds.get(name) {
            Some(sound) => sound.clone(),
            None => {
                logger::log_warning(&format!("Missing sound asset '{}', using silent stub", name));
                SoundAsset::silent(name)
            }
        }
    }
}

pub struct AssetStorePlugin;

impl Plugin for AssetStorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AssetStore>();
    }
}
