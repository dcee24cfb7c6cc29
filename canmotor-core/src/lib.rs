//! # ⚙️ canmotor-core — Controlador de motor independente de hardware
//!
//! Superfície única de controle para atuadores em barramento CAN: define
//! modo e demanda, lê posição/velocidade/corrente/temperatura e gerencia
//! slots de ganho, qualquer que seja a família do controlador. Sem hardware,
//! um modelo de resposta em forma fechada substitui o dispositivo e o resto
//! do software roda de forma determinística.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              MotorController                 │
//! │  set() ─ de-duplicação ─ despacho por modo   │
//! │  update()  position()  within_tolerance()    │
//! └──────────────────────┬───────────────────────┘
//!                        │ ActuatorBackend
//!          ┌─────────────┴──────────────┐
//!          ↓                            ↓
//!  ┌───────────────┐          ┌────────────────────┐
//!  │   Hardware    │          │     Simulated      │
//!  │ HardwareBackend│         │ device + Simulated │
//!  └───────┬───────┘          │      Actuator      │
//!          │                  └────────────────────┘
//!          ↓
//!   Driver (SPARK MAX/Flex, Talon FX/SRX) via BackendFactory
//! ```
//!
//! ## Componentes
//!
//! - [`MotorController`]: fachada pública
//! - [`SimulatedActuator`]: aproximação exponencial para posição, Euler
//!   para percentual/tensão/velocidade
//! - [`UnitConverter`]: contagens/RPM ↔ unidades físicas por segundo
//! - [`HardwareBackend`]: capacidades exigidas de um driver
//! - [`LoopbackBackend`]: dispositivo em memória para testes e simulação
//! - [`ControllerConfig`]: configuração em TOML
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::sync::Arc;
//! use canmotor_core::{ControlMode, LoopbackFactory, ManualClock, MotorController, SimConfig};
//! use canmotor_core::factory::DeviceSpec;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let clock = ManualClock::new(0.0);
//! let mut elevator = MotorController::build(
//!     &LoopbackFactory,
//!     "elevator",
//!     &DeviceSpec::talon_fx(12),
//!     Some((SimConfig::new(9.0, 1.0), Arc::new(clock.clone()))),
//! )?;
//!
//! elevator.set(ControlMode::Position, 9.0, 0.0)?;
//! for _ in 0..500 {
//!     clock.advance(0.02);
//!     elevator.update();
//! }
//! assert!(elevator.within_tolerance(0.01));
//! # Ok(())
//! # }
//! ```
//!
//! ## Características
//!
//! - **De-duplicação**: um quadro por comando *alterado*
//! - **Sem sentinela**: "nenhum comando ainda" é `None`, não um número mágico
//! - **Backend único**: hardware ou simulação decidido na construção
//! - **Configuração autoritativa no dispositivo**: a fachada não guarda ganhos

pub mod error;
pub mod types;
pub mod units;
pub mod clock;
pub mod sim;
pub mod backend;
pub mod factory;
pub mod loopback;
pub mod controller;
pub mod config;

pub use error::{MotorError, MotorResult};
pub use types::{ControlMode, GainSlot, IdleMode, LastCommand, MotorSetpoint, MotorTelemetry, ProfileConstraints, Setpoint};
pub use units::{ConversionDomain, ConversionFactor, UnitConverter};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use sim::{SimConfig, SimulatedActuator};
pub use backend::{ActuatorBackend, HardwareBackend};
pub use factory::{BackendFactory, DeviceFamily, DeviceSpec, MotorType};
pub use loopback::{LoopbackBackend, LoopbackFactory};
pub use controller::MotorController;
pub use config::{ControllerConfig, SlotConfig};
