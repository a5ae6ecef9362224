use std::fmt::{Debug, Display};
use std::path::PathBuf;

use thiserror::Error;

use crate::deps::arcstr::ArcStr;
use crate::layout::cell::PortError;

pub type Result<T> = std::result::Result<T, PcellError>;

pub struct PcellError {
    pub(crate) source: ErrorSource,
    pub(crate) context: Vec<ErrorContext>,
}

impl PcellError {
    pub fn source(&self) -> &ErrorSource {
        &self.source
    }

    pub fn context(&self) -> &[ErrorContext] {
        &self.context
    }
}

impl std::error::Error for PcellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl Display for PcellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Error:\n{}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for item in self.context.iter() {
                writeln!(f, "\twhile {}", item)?;
            }
        }
        Ok(())
    }
}

impl Debug for PcellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for (i, item) in self.context.iter().enumerate() {
                writeln!(f, "\t{}: {:?}", i, item)?;
            }
        }
        Ok(())
    }
}

impl<T> From<T> for PcellError
where
    T: Into<ErrorSource>,
{
    fn from(value: T) -> Self {
        Self {
            source: value.into(),
            context: Vec::new(),
        }
    }
}

impl PcellError {
    pub fn new(source: impl Into<ErrorSource>) -> Self {
        Self {
            source: source.into(),
            context: Vec::new(),
        }
    }

    pub fn from_context(source: impl Into<ErrorSource>, ctx: impl Into<ErrorContext>) -> Self {
        Self {
            source: source.into(),
            context: vec![ctx.into()],
        }
    }

    pub fn with_context(mut self, ctx: impl Into<ErrorContext>) -> Self {
        self.context.push(ctx.into());
        self
    }

    #[inline]
    pub fn into_inner(self) -> ErrorSource {
        self.source
    }
}

#[inline]
pub fn with_err_context<T, E, C>(result: std::result::Result<T, E>, ctx: C) -> Result<T>
where
    C: FnOnce() -> ErrorContext,
    E: Into<PcellError>,
{
    result.map_err(|err| err.into().with_context(ctx()))
}

#[derive(Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorContext {
    GenComponent { name: ArcStr, type_name: ArcStr },
    InitComponent { type_name: ArcStr },
    ReadFile(PathBuf),
    Task(ArcStr),
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorContext::*;
        match self {
            GenComponent { name, type_name } => {
                write!(f, "generating layout of component {type_name} ({name})")
            }
            InitComponent { type_name } => write!(f, "initializing component {type_name}"),
            ReadFile(path) => write!(f, "reading file {path:?}"),
            Task(task) => write!(f, "{task}"),
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorSource {
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),

    #[error("invalid layer order: {bottom} is not below {top}")]
    InvalidLayerOrder { bottom: ArcStr, top: ArcStr },

    #[error("no via defined between {bottom} and {top}")]
    UnknownViaClass { bottom: ArcStr, top: ArcStr },

    #[error("invalid layout (enable logging for details): {0}")]
    InvalidLayout(String),

    #[error("no such layer: {0}")]
    LayerNotFound(String),

    #[error("no such device: {0}")]
    DeviceNotFound(String),

    #[error("invalid pdk: {0}")]
    InvalidPdk(String),

    #[error("invalid design rules: {0}")]
    InvalidRules(String),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("error accessing layout port: {0}")]
    LayoutPort(#[from] PortError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error parsing TOML: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("error parsing JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("error parsing CSV: {0}")]
    CsvParsing(#[from] csv::Error),

    #[error("unexpected error: {0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
