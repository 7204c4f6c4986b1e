// SharedConfig - フック間で状態を受け渡すキー・バリュー設定

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// 設定操作のエラー型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("キーが見つかりません: {key}")]
    MissingKey { key: String },

    #[error("不正なキー: {key}")]
    InvalidKey { key: String },

    #[error("設定は凍結されています: {key}")]
    Frozen { key: String },

    #[error("オブジェクトではない値を辿ろうとしました: {key}")]
    NotAnObject { key: String },

    #[error("型変換エラー: {key} - {source}")]
    Conversion {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("設定ファイルI/Oエラー: {path} - {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 入れ子のJSONオブジェクトで表現された可変設定
///
/// キーは`model.device`のようなドット区切りのパスで、各要素は
/// `[A-Za-z_][A-Za-z0-9_]*`に一致する必要がある。`Clone`はディープコピー。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharedConfig {
    root: Map<String, Value>,
    #[serde(skip)]
    frozen: bool,
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn split_key(key: &str) -> Result<Vec<&str>, ConfigError> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().all(|s| is_valid_segment(s)) {
        Ok(segments)
    } else {
        Err(ConfigError::InvalidKey {
            key: key.to_string(),
        })
    }
}

fn merge_into(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming)
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

impl SharedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSONオブジェクトから作成
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(root) => Ok(Self {
                root,
                frozen: false,
            }),
            _ => Err(ConfigError::NotAnObject {
                key: "<root>".to_string(),
            }),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    /// パスの値を参照
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        let segments = split_key(key).ok()?;
        let (last, parents) = segments.split_last()?;
        let mut node = &self.root;
        for segment in parents {
            node = node.get(*segment)?.as_object()?;
        }
        node.get(*last)
    }

    /// 型付きで値を取得
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self.get_value(key).ok_or_else(|| ConfigError::MissingKey {
            key: key.to_string(),
        })?;
        T::deserialize(value).map_err(|source| ConfigError::Conversion {
            key: key.to_string(),
            source,
        })
    }

    /// 値がなければ既定値を返す（型が合わない場合はエラー）
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Err(ConfigError::MissingKey { .. }) => Ok(default),
            other => other,
        }
    }

    /// 値を設定。途中のオブジェクトは必要に応じて作成する
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), ConfigError> {
        if self.frozen {
            return Err(ConfigError::Frozen {
                key: key.to_string(),
            });
        }
        let value = serde_json::to_value(value).map_err(|source| ConfigError::Conversion {
            key: key.to_string(),
            source,
        })?;
        let segments = split_key(key)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(ConfigError::InvalidKey {
                key: key.to_string(),
            });
        };

        let mut node = &mut self.root;
        for segment in parents {
            let entry = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            node = entry.as_object_mut().ok_or_else(|| ConfigError::NotAnObject {
                key: key.to_string(),
            })?;
        }
        node.insert(last.to_string(), value);
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Result<Option<Value>, ConfigError> {
        if self.frozen {
            return Err(ConfigError::Frozen {
                key: key.to_string(),
            });
        }
        let segments = split_key(key)?;
        let Some((last, parents)) = segments.split_last() else {
            return Ok(None);
        };
        let mut node = &mut self.root;
        for segment in parents {
            match node.get_mut(*segment).and_then(Value::as_object_mut) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        Ok(node.remove(*last))
    }

    /// 他の設定を再帰的にマージ（同じキーは上書き）
    pub fn merge(&mut self, other: &SharedConfig) -> Result<(), ConfigError> {
        if self.frozen {
            return Err(ConfigError::Frozen {
                key: "<merge>".to_string(),
            });
        }
        merge_into(&mut self.root, &other.root);
        Ok(())
    }

    pub fn freeze(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// トップレベルのキー一覧
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let io_error = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        let text = std::fs::read_to_string(path).map_err(io_error)?;
        let value: Value = serde_json::from_str(&text).map_err(|source| ConfigError::Conversion {
            key: path.display().to_string(),
            source,
        })?;
        Self::from_value(value)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_string()).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

impl fmt::Display for SharedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string_pretty(&self.root).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
