use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Порт HTTP-сервера просмотрщика по умолчанию
pub const DEFAULT_PORT: u16 = 8842;

/// Имя документа с описанием дерева внутри архива
pub const DEFINITION_FILE: &str = "definition.json";

/// Идентификатор формата архива
pub const ARCHIVE_FORMAT: &str = "cadview-archive";

/// Текущая версия формата архива.
/// Версия 1: «голая» запись корневого узла без конверта.
pub const ARCHIVE_VERSION: u32 = 2;

/// MIME-тип тела POST-запроса с архивом
pub const ARCHIVE_CONTENT_TYPE: &str = "application/binary";

/// Ответы транспортного сервера (тело text/plain, статус всегда 200)
pub mod reply {
    pub const RUNNING: &str = "Running";
    pub const STOPPED: &str = "Stopped";
    pub const DONE: &str = "Done";
    pub const IGNORED: &str = "Ignored";
}

// ============================================================================
// Диагностика
// ============================================================================

/// Результат, который мог быть получен с деградацией (значение по умолчанию).
///
/// `warnings` пуст, если операция прошла без замечаний.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosed<T> {
    pub value: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T> Diagnosed<T> {
    /// Значение без предупреждений
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Значение по умолчанию с одним предупреждением
    pub fn degraded(value: T, warning: impl Into<String>) -> Self {
        Self {
            value,
            warnings: vec![warning.into()],
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Diagnosed<U> {
        Diagnosed {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

// ============================================================================
// Цвет
// ============================================================================

/// Цвет RGB, компоненты в диапазоне [0, 1].
///
/// В JSON записывается как массив `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    /// Янтарный цвет по умолчанию для деталей без явного цвета
    pub const DEFAULT: Rgb = Rgb {
        r: 232.0 / 255.0,
        g: 176.0 / 255.0,
        b: 36.0 / 255.0,
    };

    /// Серый цвет, подставляемый вместо некорректного
    pub const GREY: Rgb = Rgb {
        r: 160.0 / 255.0,
        g: 160.0 / 255.0,
        b: 160.0 / 255.0,
    };

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Проверенный конструктор: компоненты вне [0, 1] дают серый цвет с предупреждением
    pub fn from_components(r: f64, g: f64, b: f64) -> Diagnosed<Rgb> {
        let valid = [r, g, b]
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c));
        if valid {
            Diagnosed::clean(Rgb::new(r, g, b))
        } else {
            Diagnosed::degraded(
                Rgb::GREY,
                format!("({r}, {g}, {b}) is an invalid color, using grey (#a0a0a0)"),
            )
        }
    }

    /// Из 8-битных компонент
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    /// В 8-битные компоненты
    pub fn to_u8(&self) -> [u8; 3] {
        [self.r, self.g, self.b].map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Цвет в виде `#rrggbb`
    pub fn web_color(&self) -> String {
        let [r, g, b] = self.to_u8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    pub fn to_f32(&self) -> [f32; 3] {
        [self.r as f32, self.g as f32, self.b as f32]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::DEFAULT
    }
}

impl From<[f64; 3]> for Rgb {
    fn from(c: [f64; 3]) -> Self {
        Rgb::new(c[0], c[1], c[2])
    }
}

impl From<Rgb> for [f64; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

// ============================================================================
// Положение узла
// ============================================================================

/// Положение узла: перенос `t` и единичный кватернион поворота `q = (x, y, z, w)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub t: [f64; 3],
    pub q: [f64; 4],
}

impl LocationRecord {
    pub const IDENTITY: LocationRecord = LocationRecord {
        t: [0.0, 0.0, 0.0],
        q: [0.0, 0.0, 0.0, 1.0],
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for LocationRecord {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ============================================================================
// Описание дерева сборки в архиве
// ============================================================================

/// Запись узла дерева сборки.
///
/// `filename` пуст у групп без геометрии. `loc` и `color` необязательны:
/// при отсутствии подставляются тождественное положение и цвет по умолчанию.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<LocationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    #[serde(default)]
    pub children: Vec<NodeRecord>,
}

impl NodeRecord {
    /// Пустая группа
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: String::new(),
            loc: None,
            color: None,
            children: Vec::new(),
        }
    }

    /// Узел без геометрии
    pub fn is_group(&self) -> bool {
        self.filename.is_empty()
    }

    /// Количество узлов в поддереве (включая этот)
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(NodeRecord::count).sum::<usize>()
    }

    /// Все непустые пути к файлам геометрии (pre-order)
    pub fn filenames(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_filenames(&mut out);
        out
    }

    fn collect_filenames<'a>(&'a self, out: &mut Vec<&'a str>) {
        if !self.filename.is_empty() {
            out.push(&self.filename);
        }
        for child in &self.children {
            child.collect_filenames(out);
        }
    }
}

fn default_export_format() -> String {
    "brep".to_string()
}

/// Конверт документа `definition.json` (версия 2+)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveDefinition {
    pub format: String,
    pub version: u32,
    /// Формат обменных файлов геометрии
    #[serde(default = "default_export_format")]
    pub export_format: String,
    pub root: NodeRecord,
}

impl ArchiveDefinition {
    pub fn new(export_format: impl Into<String>, root: NodeRecord) -> Self {
        Self {
            format: ARCHIVE_FORMAT.to_string(),
            version: ARCHIVE_VERSION,
            export_format: export_format.into(),
            root,
        }
    }
}

/// Документ `definition.json` любой поддерживаемой версии
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefinitionDocument {
    Enveloped(ArchiveDefinition),
    /// Версия 1: корневая запись без конверта
    Bare(NodeRecord),
}

impl DefinitionDocument {
    /// Привести к текущему конверту
    pub fn into_definition(self) -> ArchiveDefinition {
        match self {
            DefinitionDocument::Enveloped(def) => def,
            DefinitionDocument::Bare(root) => ArchiveDefinition {
                format: ARCHIVE_FORMAT.to_string(),
                version: 1,
                export_format: default_export_format(),
                root,
            },
        }
    }
}

// ============================================================================
// Параметры отображения (query string)
// ============================================================================

/// Значение параметра отображения, приведённое из строки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl OptionValue {
    /// Приведение: целое, затем вещественное, затем логическое, иначе строка
    pub fn coerce(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            return OptionValue::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return OptionValue::Float(f);
        }
        match raw {
            "True" | "true" => OptionValue::Bool(true),
            "False" | "false" => OptionValue::Bool(false),
            _ => OptionValue::Str(raw.to_string()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            OptionValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Int(i) => Some(*i as f64),
            OptionValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Float(x) => write!(f, "{x}"),
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Str(s) => f.write_str(s),
        }
    }
}

/// Параметры отображения, упорядоченные по ключу
pub type DisplayOptions = BTreeMap<String, OptionValue>;

/// Собрать параметры отображения из пар query string.
///
/// Пары должны быть уже декодированы (percent-decoding делает HTTP слой).
/// Пары с пустым ключом пропускаются с предупреждением, при повторе ключа
/// побеждает последнее значение.
pub fn options_from_pairs<I, K, V>(pairs: I) -> Diagnosed<DisplayOptions>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    let mut result = Diagnosed::clean(DisplayOptions::new());
    for (key, value) in pairs {
        let key = key.into();
        let value = value.as_ref();
        if key.is_empty() {
            result.warn(format!("query parameter without a name: '={value}'"));
            continue;
        }
        result.value.insert(key, OptionValue::coerce(value));
    }
    result
}
