//! RON I/O
use crate::config::{GridConfig, ModelConfig};
use crate::traits::RONImport;

impl RONImport for GridConfig {}

impl RONImport for ModelConfig {}
