use thiserror::Error;

use crate::llm::LlmError;

/// Every way a problem can fail to produce a solution.
///
/// Messages are user-facing and in Spanish, like the rest of the page.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("El problema está vacío")]
    ProblemaVacio,
    #[error("No se reconoció el tipo de operación.")]
    OperacionNoReconocida,
    #[error("No se proporcionó ninguna expresión")]
    SinExpresion,
    #[error("Tipo de operación no soportado")]
    OperacionNoSoportada,
    #[error("La expresión no es válida: {0}")]
    ExpresionInvalida(String),
    #[error("Error al ejecutar el código: {0}")]
    Ejecucion(String),
    #[error("Error del modelo de lenguaje: {0}")]
    Modelo(#[from] LlmError),
}

impl SolveError {
    /// True when the input itself is at fault rather than the model or the
    /// engine.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Ejecucion(_) | Self::Modelo(_))
    }
}
