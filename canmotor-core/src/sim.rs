//! Simulação de resposta do motor
//!
//! Modelo em forma fechada, dirigido apenas por `(modo, demanda)` e pelo
//! relógio. Unidades internas: posição em revoluções, velocidade em
//! revoluções por minuto. A leitura externa escala por CPR, de forma que o
//! chamador vê as mesmas unidades que usou no comando.
//!
//! ```text
//!  posição
//!    │            ┌──────────── demanda (snap < 0.01)
//!    │        ╭───╯
//!    │     ╭──╯     origem + sinal(a)·|a|·(1 − e^(−t/b))
//!    │   ╭─╯        b = |a| / response_time_factor
//!    │  ╱
//!    │ ╱
//!    └┴──────────────────────────── t
//! ```

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::trace;
use crate::clock::Clock;
use crate::error::{MotorError, MotorResult};
use crate::types::{ControlMode, Setpoint};
use crate::units::SECONDS_PER_MINUTE;

/// Tolerância absoluta (unidades internas) do snap para o alvo
pub const SNAP_TOLERANCE: f64 = 0.01;

/// Tensão nominal de barramento usada para normalizar o modo Voltage
pub const NOMINAL_BUS_VOLTAGE: f64 = 12.0;

/// Configuração do simulador
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Maior = acomoda mais rápido
    pub response_time_factor: f64,
    /// Contagens por revolução
    pub counts_per_revolution: f64,
}

impl SimConfig {
    /// Cria configuração (validada na construção do simulador)
    pub fn new(response_time_factor: f64, counts_per_revolution: f64) -> Self {
        Self { response_time_factor, counts_per_revolution }
    }

    /// Fator zero ou negativo produziria NaN em tempo de execução
    pub fn validate(&self) -> MotorResult<()> {
        if !self.response_time_factor.is_finite() || self.response_time_factor <= 0.0 {
            return Err(MotorError::InvalidConfig(format!(
                "response_time_factor must be finite and positive, got {}",
                self.response_time_factor
            )));
        }
        if !self.counts_per_revolution.is_finite() || self.counts_per_revolution <= 0.0 {
            return Err(MotorError::InvalidConfig(format!(
                "counts_per_revolution must be finite and positive, got {}",
                self.counts_per_revolution
            )));
        }
        Ok(())
    }

    /// Segundos para uma revolução com saída total
    pub fn seconds_per_revolution(&self) -> f64 {
        self.response_time_factor.sqrt()
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// Atuador simulado
#[derive(Debug, Clone)]
pub struct SimulatedActuator {
    config: SimConfig,
    seconds_per_revolution: f64,
    clock: Arc<dyn Clock>,
    setpoint: Setpoint,
    last_update: f64,
    /// Referência da diferença finita
    last_position: f64,
    position: f64,
    velocity: f64,
}

impl SimulatedActuator {
    /// Cria simulador parado em posição zero, em PercentOutput 0
    pub fn new(config: SimConfig, clock: Arc<dyn Clock>) -> MotorResult<Self> {
        config.validate()?;

        let now = clock.now();
        Ok(Self {
            config,
            seconds_per_revolution: config.seconds_per_revolution(),
            clock,
            setpoint: Setpoint::new(now, ControlMode::PercentOutput, 0.0, 0.0),
            last_update: now,
            last_position: 0.0,
            position: 0.0,
            velocity: 0.0,
        })
    }

    /// Retorna configuração
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Setpoint corrente (unidades internas)
    pub fn setpoint(&self) -> &Setpoint {
        &self.setpoint
    }

    /// Substitui o setpoint corrente, abandonando qualquer movimento em curso
    pub fn set(&mut self, mode: ControlMode, demand: f64) {
        let cpr = self.config.counts_per_revolution;
        let value = if mode.is_position() {
            demand / cpr
        } else if mode.is_velocity() {
            demand * SECONDS_PER_MINUTE / cpr
        } else {
            demand
        };

        self.setpoint = Setpoint::new(self.clock.now(), mode, value, self.position);
    }

    /// Avança o modelo até o instante atual do relógio
    pub fn update(&mut self) {
        let now = self.clock.now();
        let elapsed = (now - self.last_update).max(0.0);
        let demand = self.setpoint.demand;

        match self.setpoint.mode {
            ControlMode::PercentOutput => {
                self.drive(SECONDS_PER_MINUTE * demand / self.seconds_per_revolution, elapsed);
            }
            ControlMode::Voltage => {
                let percent = demand / NOMINAL_BUS_VOLTAGE;
                self.drive(SECONDS_PER_MINUTE * percent / self.seconds_per_revolution, elapsed);
            }
            ControlMode::Velocity | ControlMode::ProfiledVelocity => {
                self.drive(demand, elapsed);
            }
            ControlMode::Position | ControlMode::ProfiledPosition => {
                self.approach(now, elapsed);
            }
        }

        trace!(
            mode = %self.setpoint.mode,
            position = self.position,
            velocity = self.velocity,
            elapsed,
            "sim step"
        );

        self.last_position = self.position;
        self.last_update = now;
    }

    /// Integração de Euler; modos sem alvo não podem ultrapassar nada
    fn drive(&mut self, velocity_rpm: f64, elapsed: f64) {
        self.velocity = velocity_rpm;
        self.position += elapsed * velocity_rpm / SECONDS_PER_MINUTE;
    }

    /// Aproximação exponencial de primeira ordem (carga de capacitor).
    /// A velocidade é a diferença finita entre passos, não a derivada
    /// analítica: aproximação aceita.
    fn approach(&mut self, now: f64, elapsed: f64) {
        let Setpoint { issued_at, demand, origin_position, .. } = self.setpoint;

        if (demand - self.position).abs() < SNAP_TOLERANCE {
            self.position = demand;
        } else {
            let t = now - issued_at;
            let a = demand - origin_position;
            let b = a.abs() / self.config.response_time_factor;

            // Sem deslocamento a curva é constante na demanda
            self.position = if b > 0.0 {
                origin_position + a.signum() * a.abs() * (1.0 - (-t / b).exp())
            } else {
                demand
            };
            if (demand - self.position).abs() < SNAP_TOLERANCE {
                self.position = demand;
            }
        }

        if elapsed > 0.0 {
            self.velocity = SECONDS_PER_MINUTE * (self.position - self.last_position) / elapsed;
        }
    }

    /// Posição em unidades do chamador
    pub fn position(&self) -> f64 {
        self.position * self.config.counts_per_revolution
    }

    /// Velocidade em unidades do chamador por segundo
    pub fn velocity(&self) -> f64 {
        self.velocity * self.config.counts_per_revolution / SECONDS_PER_MINUTE
    }

    /// Rebaseia a posição sem tocar velocidade nem setpoint
    pub fn set_encoder_position(&mut self, position: f64) {
        self.position = position / self.config.counts_per_revolution;
        self.last_position = self.position;
    }
}
