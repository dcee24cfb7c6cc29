//! Tipos de dados para controle de motor

use std::fmt;
use serde::{Deserialize, Serialize};

/// Modo de controle (semântica da demanda enviada)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// Saída em fração da tensão de barramento (-1.0 a 1.0)
    PercentOutput,
    /// Saída em volts
    Voltage,
    /// Posição em malha fechada
    Position,
    /// Velocidade em malha fechada
    Velocity,
    /// Posição com perfil de movimento (vel/acel limitadas)
    ProfiledPosition,
    /// Velocidade com perfil de movimento
    ProfiledVelocity,
}

impl ControlMode {
    /// Todos os modos, na ordem de declaração
    pub const ALL: [ControlMode; 6] = [
        ControlMode::PercentOutput,
        ControlMode::Voltage,
        ControlMode::Position,
        ControlMode::Velocity,
        ControlMode::ProfiledPosition,
        ControlMode::ProfiledVelocity,
    ];

    /// Acionamento direto, sem malha fechada
    pub fn is_open_loop(&self) -> bool {
        matches!(self, ControlMode::PercentOutput | ControlMode::Voltage)
    }

    /// Malha fechada no dispositivo
    pub fn is_closed_loop(&self) -> bool {
        !self.is_open_loop()
    }

    /// Movimento com perfil (vel/acel limitadas)
    pub fn is_profiled(&self) -> bool {
        matches!(self, ControlMode::ProfiledPosition | ControlMode::ProfiledVelocity)
    }

    /// Demanda é posição
    pub fn is_position(&self) -> bool {
        matches!(self, ControlMode::Position | ControlMode::ProfiledPosition)
    }

    /// Demanda é velocidade
    pub fn is_velocity(&self) -> bool {
        matches!(self, ControlMode::Velocity | ControlMode::ProfiledVelocity)
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlMode::PercentOutput => "percent_output",
            ControlMode::Voltage => "voltage",
            ControlMode::Position => "position",
            ControlMode::Velocity => "velocity",
            ControlMode::ProfiledPosition => "profiled_position",
            ControlMode::ProfiledVelocity => "profiled_velocity",
        };
        f.write_str(name)
    }
}

/// Setpoint aceito pelo simulador.
///
/// Criado uma única vez por comando aceito e substituído (nunca mutado)
/// pelo próximo. Valores em unidades internas do simulador.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Setpoint {
    /// Instante de emissão (s)
    pub issued_at: f64,
    /// Modo de controle
    pub mode: ControlMode,
    /// Demanda já convertida
    pub demand: f64,
    /// Posição no instante da emissão (âncora da curva de posição)
    pub origin_position: f64,
}

impl Setpoint {
    /// Cria setpoint
    pub fn new(issued_at: f64, mode: ControlMode, demand: f64, origin_position: f64) -> Self {
        Self { issued_at, mode, demand, origin_position }
    }
}

/// Último comando aceito pela fachada
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastCommand {
    pub mode: ControlMode,
    pub demand: f64,
    pub feedforward: f64,
}

impl LastCommand {
    /// Igualdade bit a bit, usada na de-duplicação
    pub fn is_repeat(&self, mode: ControlMode, demand: f64, feedforward: f64) -> bool {
        self.mode == mode
            && self.demand.to_bits() == demand.to_bits()
            && self.feedforward.to_bits() == feedforward.to_bits()
    }
}

/// Par (modo, saída) que um subsistema entrega ao controlador
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorSetpoint {
    pub mode: ControlMode,
    pub output: f64,
}

impl MotorSetpoint {
    /// Cria par (modo, saída)
    pub fn new(mode: ControlMode, output: f64) -> Self {
        Self { mode, output }
    }
}

impl Default for MotorSetpoint {
    fn default() -> Self {
        Self::new(ControlMode::PercentOutput, 0.0)
    }
}

/// Comportamento com saída zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleMode {
    #[default]
    Brake,
    Coast,
}

impl IdleMode {
    /// Converte flag `coast`
    pub fn from_coast(coast: bool) -> Self {
        if coast { IdleMode::Coast } else { IdleMode::Brake }
    }

    /// Verifica se roda livre
    pub fn is_coast(&self) -> bool {
        matches!(self, IdleMode::Coast)
    }
}

impl fmt::Display for IdleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdleMode::Brake => f.write_str("Brake"),
            IdleMode::Coast => f.write_str("Coast"),
        }
    }
}

/// Restrições de perfil de movimento de um slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileConstraints {
    pub max_velocity: f64,
    pub max_acceleration: f64,
    pub tolerance: f64,
}

/// Banco de ganhos de malha fechada
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GainSlot {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub f: f64,
    /// Só presente após `configure_profiled`
    #[serde(default)]
    pub profile: Option<ProfileConstraints>,
}

impl GainSlot {
    /// Cria slot sem perfil
    pub fn pidf(p: f64, i: f64, d: f64, f: f64) -> Self {
        Self { p, i, d, f, profile: None }
    }
}

/// Leitura completa de um ciclo
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotorTelemetry {
    /// Posição (unidade física)
    pub position: f64,
    /// Velocidade (unidade física por segundo)
    pub velocity: f64,
    /// Saída aplicada (-1.0 a 1.0)
    pub percent: f64,
    /// Corrente (A)
    pub current: f64,
    /// Temperatura (°C)
    pub temperature: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_mode_families() {
        assert!(ControlMode::PercentOutput.is_open_loop());
        assert!(ControlMode::Voltage.is_open_loop());
        assert!(ControlMode::Position.is_closed_loop());
        assert!(ControlMode::ProfiledVelocity.is_profiled());
        assert!(!ControlMode::Velocity.is_profiled());
        assert!(ControlMode::ProfiledPosition.is_position());
        assert!(ControlMode::ProfiledVelocity.is_velocity());
        assert!(!ControlMode::Voltage.is_position());
    }

    #[test]
    fn test_control_mode_partition() {
        for mode in ControlMode::ALL {
            let kinds = [mode.is_open_loop(), mode.is_position(), mode.is_velocity()];
            assert_eq!(kinds.iter().filter(|k| **k).count(), 1, "{mode}");
        }
    }

    #[test]
    fn test_control_mode_serde_names() {
        let json = serde_json::to_string(&ControlMode::ProfiledPosition).unwrap();
        assert_eq!(json, "\"profiled_position\"");
        let mode: ControlMode = serde_json::from_str("\"percent_output\"").unwrap();
        assert_eq!(mode, ControlMode::PercentOutput);
    }

    #[test]
    fn test_last_command_repeat_is_bitwise() {
        let last = LastCommand { mode: ControlMode::Position, demand: 0.0, feedforward: 0.0 };
        assert!(last.is_repeat(ControlMode::Position, 0.0, 0.0));
        assert!(!last.is_repeat(ControlMode::Position, -0.0, 0.0));
        assert!(!last.is_repeat(ControlMode::Velocity, 0.0, 0.0));
        assert!(!last.is_repeat(ControlMode::Position, 0.0, 0.1));
    }

    #[test]
    fn test_last_command_nan_repeat() {
        let last = LastCommand { mode: ControlMode::Voltage, demand: f64::NAN, feedforward: 0.0 };
        assert!(last.is_repeat(ControlMode::Voltage, f64::NAN, 0.0));
    }

    #[test]
    fn test_motor_setpoint_default() {
        let sp = MotorSetpoint::default();
        assert_eq!(sp.mode, ControlMode::PercentOutput);
        assert_eq!(sp.output, 0.0);
    }

    #[test]
    fn test_idle_mode() {
        assert_eq!(IdleMode::from_coast(true), IdleMode::Coast);
        assert_eq!(IdleMode::from_coast(false), IdleMode::Brake);
        assert_eq!(IdleMode::default().to_string(), "Brake");
        assert!(IdleMode::Coast.is_coast());
    }
}
