//! Erros da camada de controle de motor

use thiserror::Error;

pub type MotorResult<T> = Result<T, MotorError>;

/// Erros de controlador de motor
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MotorError {
    /// Configuração inválida
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Fora de alcance
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Slot de ganho inexistente no dispositivo
    #[error("Unsupported gain slot {slot} (device has {available})")]
    UnsupportedSlot { slot: u8, available: u8 },

    /// Comando rejeitado pelo dispositivo
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// Comunicação falhou
    #[error("Communication failed: {0}")]
    CommunicationFailed(String),

    /// Arquivo de configuração malformado
    #[error("Config parse error: {0}")]
    ConfigParse(String),

    /// Erro de I/O ao ler configuração
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<toml::de::Error> for MotorError {
    fn from(err: toml::de::Error) -> Self {
        MotorError::ConfigParse(err.to_string())
    }
}

impl From<std::io::Error> for MotorError {
    fn from(err: std::io::Error) -> Self {
        MotorError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MotorError::CommandFailed("frame dropped".into());
        assert!(err.to_string().contains("Command failed"));
    }

    #[test]
    fn test_invalid_config_display() {
        let err = MotorError::InvalidConfig("response_time_factor must be positive".into());
        assert!(err.to_string().starts_with("Invalid configuration"));
    }

    #[test]
    fn test_unsupported_slot_display() {
        let err = MotorError::UnsupportedSlot { slot: 5, available: 3 };
        assert_eq!(err.to_string(), "Unsupported gain slot 5 (device has 3)");
    }

    #[test]
    fn test_error_from_toml() {
        let parsed: Result<toml::Table, _> = toml::from_str("name = ");
        let err: MotorError = parsed.unwrap_err().into();
        assert!(matches!(err, MotorError::ConfigParse(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml");
        let err: MotorError = io.into();
        assert!(err.to_string().contains("missing.toml"));
    }
}
