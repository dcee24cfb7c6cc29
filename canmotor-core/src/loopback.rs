//! Dispositivo em memória
//!
//! Implementa o conjunto completo de capacidades sem barramento físico:
//! guarda ganhos, slots, fatores e modo ocioso como um controlador real,
//! espelha comandos instantaneamente e conta o tráfego gerado. Clones
//! compartilham o mesmo estado, o que permite inspecionar o dispositivo
//! depois de entregá-lo à fachada.

use std::sync::{Arc, Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::backend::HardwareBackend;
use crate::error::{MotorError, MotorResult};
use crate::factory::{BackendFactory, DeviceFamily, DeviceSpec, MotorType};
use crate::sim::NOMINAL_BUS_VOLTAGE;
use crate::types::{ControlMode, GainSlot, IdleMode, ProfileConstraints};
use crate::units::{ConversionDomain, ConversionFactor, UnitConverter};

/// Corrente simulada em saída total (A)
pub const FULL_OUTPUT_CURRENT_A: f64 = 5.0;

/// Temperatura reportada (°C)
pub const AMBIENT_TEMPERATURE_C: f64 = 25.0;

/// Parâmetros configuráveis do dispositivo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub slots: Vec<GainSlot>,
    pub converter: UnitConverter,
    pub idle_mode: IdleMode,
    pub inverted: bool,
}

impl DeviceConfig {
    /// Padrões de fábrica para uma família
    pub fn factory_defaults(family: DeviceFamily) -> Self {
        Self {
            slots: vec![GainSlot::default(); family.gain_slot_count() as usize],
            converter: UnitConverter::default(),
            idle_mode: IdleMode::Brake,
            inverted: false,
        }
    }
}

/// Contadores de tráfego
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoopbackStats {
    /// Quadros de comando enviados
    pub frames_sent: u64,
    /// Chamadas de `apply_config`
    pub config_applies: u64,
    /// Gravações na memória persistente
    pub flash_writes: u64,
    /// Restaurações de fábrica
    pub factory_resets: u64,
}

/// Último comando recebido (unidades do dispositivo)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentFrame {
    pub mode: ControlMode,
    pub demand: f64,
    pub feedforward: f64,
}

/// Estado interno do dispositivo
#[derive(Debug, Clone)]
pub struct LoopbackState {
    pub family: DeviceFamily,
    pub can_id: u8,
    /// Tipo de motor (famílias SPARK)
    pub motor_type: Option<MotorType>,
    /// Alterações ainda não aplicadas
    pub pending: DeviceConfig,
    /// Configuração em vigor
    pub applied: DeviceConfig,
    /// Última configuração persistida
    pub persisted: Option<DeviceConfig>,
    pub selected_slot: u8,
    /// Posição (contagens)
    pub position_raw: f64,
    /// Velocidade (contagens/min)
    pub velocity_raw: f64,
    /// Saída aplicada (-1.0 a 1.0)
    pub percent: f64,
    pub last_frame: Option<SentFrame>,
    pub stats: LoopbackStats,
    /// Falha injetada no próximo `send`
    pub fail_next_send: Option<String>,
}

impl LoopbackState {
    /// Cria estado com padrões de fábrica
    pub fn new(family: DeviceFamily, can_id: u8) -> Self {
        let defaults = DeviceConfig::factory_defaults(family);
        Self {
            family,
            can_id,
            motor_type: family.is_spark().then(MotorType::default),
            pending: defaults.clone(),
            applied: defaults,
            persisted: None,
            selected_slot: 0,
            position_raw: 0.0,
            velocity_raw: 0.0,
            percent: 0.0,
            last_frame: None,
            stats: LoopbackStats::default(),
            fail_next_send: None,
        }
    }

    fn check_slot(&self, slot: u8) -> MotorResult<()> {
        let available = self.family.gain_slot_count();
        if slot >= available {
            return Err(MotorError::UnsupportedSlot { slot, available });
        }
        Ok(())
    }

    fn direction(&self) -> f64 {
        if self.applied.inverted { -1.0 } else { 1.0 }
    }

    /// Espelha um comando: sem dinâmica, o alvo é atingido na hora
    pub fn mirror(&mut self, mode: ControlMode, demand: f64, feedforward: f64) {
        let sign = self.direction();
        match mode {
            ControlMode::PercentOutput => {
                self.percent = (sign * demand).clamp(-1.0, 1.0);
            }
            ControlMode::Voltage => {
                self.percent = (sign * demand / NOMINAL_BUS_VOLTAGE).clamp(-1.0, 1.0);
            }
            ControlMode::Position | ControlMode::ProfiledPosition => {
                self.position_raw = demand;
                self.velocity_raw = 0.0;
                self.percent = (sign * feedforward / NOMINAL_BUS_VOLTAGE).clamp(-1.0, 1.0);
            }
            ControlMode::Velocity | ControlMode::ProfiledVelocity => {
                self.velocity_raw = demand;
                self.percent = (sign * feedforward / NOMINAL_BUS_VOLTAGE).clamp(-1.0, 1.0);
            }
        }
    }
}

fn check_finite(name: &str, values: &[f64]) -> MotorResult<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(MotorError::InvalidConfig(format!("{} values must be finite", name)));
    }
    Ok(())
}

/// Dispositivo em memória (implementa [`HardwareBackend`]).
///
/// `pending` guarda a configuração completa, não um delta. Por isso
/// `apply_config(true, _)` produz o mesmo estado aplicado que
/// `apply_config(false, _)`: a restauração de fábrica neste dispositivo só
/// aparece em [`LoopbackStats::factory_resets`].
#[derive(Debug, Clone)]
pub struct LoopbackBackend {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackBackend {
    /// Cria dispositivo com padrões de fábrica
    pub fn new(family: DeviceFamily, can_id: u8) -> Self {
        Self { state: Arc::new(Mutex::new(LoopbackState::new(family, can_id))) }
    }

    /// Cria a partir de uma especificação validada
    pub fn from_spec(spec: &DeviceSpec) -> MotorResult<Self> {
        spec.validate()?;
        let backend = Self::new(spec.family, spec.can_id);
        backend.lock().motor_type = spec.effective_motor_type();
        Ok(backend)
    }

    fn lock(&self) -> MutexGuard<'_, LoopbackState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cópia do estado interno
    pub fn state(&self) -> LoopbackState {
        self.lock().clone()
    }

    /// Retorna contadores de tráfego
    pub fn stats(&self) -> LoopbackStats {
        self.lock().stats
    }

    /// Retorna último comando recebido
    pub fn last_frame(&self) -> Option<SentFrame> {
        self.lock().last_frame
    }

    /// Tipo de motor informado na criação; `None` fora das famílias SPARK
    pub fn motor_type(&self) -> Option<MotorType> {
        self.lock().motor_type
    }

    /// Verifica inversão em vigor
    pub fn is_inverted(&self) -> bool {
        self.lock().applied.inverted
    }

    /// Retorna última configuração persistida
    pub fn persisted(&self) -> Option<DeviceConfig> {
        self.lock().persisted.clone()
    }

    /// Faz o próximo `send` falhar com erro de comunicação
    pub fn fail_next_send(&self, reason: &str) {
        self.lock().fail_next_send = Some(reason.to_string());
    }
}

impl HardwareBackend for LoopbackBackend {
    fn family(&self) -> DeviceFamily {
        self.lock().family
    }

    fn send(&mut self, mode: ControlMode, demand: f64, feedforward: f64) -> MotorResult<()> {
        let mut state = self.lock();

        if let Some(reason) = state.fail_next_send.take() {
            return Err(MotorError::CommunicationFailed(reason));
        }

        state.mirror(mode, demand, feedforward);
        state.last_frame = Some(SentFrame { mode, demand, feedforward });
        state.stats.frames_sent += 1;
        Ok(())
    }

    fn read_position(&self) -> f64 {
        self.lock().position_raw
    }

    fn read_velocity(&self) -> f64 {
        self.lock().velocity_raw
    }

    fn read_output_percent(&self) -> f64 {
        self.lock().percent
    }

    fn read_output_current(&self) -> f64 {
        self.lock().percent.abs() * FULL_OUTPUT_CURRENT_A
    }

    fn read_temperature(&self) -> f64 {
        AMBIENT_TEMPERATURE_C
    }

    fn configure_gains(&mut self, slot: u8, p: f64, i: f64, d: f64, f: f64) -> MotorResult<()> {
        let mut state = self.lock();
        state.check_slot(slot)?;
        check_finite("gain", &[p, i, d, f])?;

        let entry = &mut state.pending.slots[slot as usize];
        entry.p = p;
        entry.i = i;
        entry.d = d;
        entry.f = f;
        Ok(())
    }

    fn configure_profile(
        &mut self,
        slot: u8,
        max_velocity: f64,
        max_acceleration: f64,
        tolerance: f64,
    ) -> MotorResult<()> {
        let mut state = self.lock();
        state.check_slot(slot)?;
        check_finite("profile", &[max_velocity, max_acceleration, tolerance])?;
        if max_velocity <= 0.0 || max_acceleration <= 0.0 || tolerance < 0.0 {
            return Err(MotorError::OutOfRange(format!(
                "profile limits must be positive (vel={}, acc={}, tol={})",
                max_velocity, max_acceleration, tolerance
            )));
        }

        state.pending.slots[slot as usize].profile = Some(ProfileConstraints {
            max_velocity,
            max_acceleration,
            tolerance,
        });
        Ok(())
    }

    fn gains(&self, slot: u8) -> MotorResult<GainSlot> {
        let state = self.lock();
        state.check_slot(slot)?;
        Ok(state.applied.slots[slot as usize])
    }

    fn select_gain_slot(&mut self, slot: u8) -> MotorResult<()> {
        let mut state = self.lock();
        state.check_slot(slot)?;
        state.selected_slot = slot;
        Ok(())
    }

    fn current_gain_slot(&self) -> u8 {
        self.lock().selected_slot
    }

    fn set_conversion_factor(&mut self, factor: ConversionFactor) -> MotorResult<()> {
        self.lock().pending.converter.set_factor(factor)
    }

    fn conversion_factor(&self, domain: ConversionDomain) -> f64 {
        self.lock().applied.converter.scale(domain)
    }

    fn set_idle_behavior(&mut self, mode: IdleMode) -> MotorResult<()> {
        self.lock().pending.idle_mode = mode;
        Ok(())
    }

    fn idle_behavior(&self) -> IdleMode {
        self.lock().applied.idle_mode
    }

    fn set_inverted(&mut self, inverted: bool) -> MotorResult<()> {
        self.lock().pending.inverted = inverted;
        Ok(())
    }

    fn set_encoder_position(&mut self, raw: f64) -> MotorResult<()> {
        check_finite("encoder position", &[raw])?;
        self.lock().position_raw = raw;
        Ok(())
    }

    fn apply_config(&mut self, reset_to_defaults: bool, persist: bool) -> MotorResult<()> {
        let mut state = self.lock();

        // Sem efeito além do contador: pending já é a configuração inteira
        if reset_to_defaults {
            state.stats.factory_resets += 1;
        }
        state.applied = state.pending.clone();
        state.stats.config_applies += 1;

        if persist {
            state.persisted = Some(state.applied.clone());
            state.stats.flash_writes += 1;
        }

        debug!(
            family = %state.family,
            can_id = state.can_id,
            reset_to_defaults,
            persist,
            "loopback config applied"
        );
        Ok(())
    }
}

/// Fábrica que produz [`LoopbackBackend`] para qualquer família
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopbackFactory;

impl BackendFactory for LoopbackFactory {
    fn create(&self, spec: &DeviceSpec) -> MotorResult<Box<dyn HardwareBackend>> {
        Ok(Box::new(LoopbackBackend::from_spec(spec)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_new() {
        let dev = LoopbackBackend::new(DeviceFamily::TalonFx, 4);
        let state = dev.state();
        assert_eq!(state.can_id, 4);
        assert_eq!(state.applied.slots.len(), 3);
        assert_eq!(dev.stats(), LoopbackStats::default());
        assert_eq!(dev.read_temperature(), AMBIENT_TEMPERATURE_C);
    }

    #[test]
    fn test_loopback_send_counts_frames() {
        let mut dev = LoopbackBackend::new(DeviceFamily::SparkMax, 1);
        dev.send(ControlMode::PercentOutput, 0.5, 0.0).unwrap();
        dev.send(ControlMode::PercentOutput, 0.5, 0.0).unwrap();
        assert_eq!(dev.stats().frames_sent, 2);
        assert_eq!(dev.read_output_percent(), 0.5);
        assert!((dev.read_output_current() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_loopback_voltage_and_clamp() {
        let mut dev = LoopbackBackend::new(DeviceFamily::SparkMax, 1);
        dev.send(ControlMode::Voltage, 6.0, 0.0).unwrap();
        assert_eq!(dev.read_output_percent(), 0.5);
        dev.send(ControlMode::PercentOutput, 3.0, 0.0).unwrap();
        assert_eq!(dev.read_output_percent(), 1.0);
    }

    #[test]
    fn test_loopback_mirrors_closed_loop() {
        let mut dev = LoopbackBackend::new(DeviceFamily::TalonSrx, 1);
        dev.send(ControlMode::Position, 4096.0, 1.2).unwrap();
        assert_eq!(dev.read_position(), 4096.0);
        assert!((dev.read_output_percent() - 0.1).abs() < 1e-9);
        dev.send(ControlMode::ProfiledVelocity, 600.0, 0.0).unwrap();
        assert_eq!(dev.read_velocity(), 600.0);
    }

    #[test]
    fn test_loopback_inverted_output() {
        let mut dev = LoopbackBackend::new(DeviceFamily::SparkFlex, 1);
        dev.set_inverted(true).unwrap();
        assert!(!dev.is_inverted());
        dev.apply_config(false, false).unwrap();
        assert!(dev.is_inverted());
        dev.send(ControlMode::PercentOutput, 0.25, 0.0).unwrap();
        assert_eq!(dev.read_output_percent(), -0.25);
    }

    #[test]
    fn test_loopback_gains_pending_until_applied() {
        let mut dev = LoopbackBackend::new(DeviceFamily::SparkMax, 1);
        dev.configure_gains(1, 0.1, 0.0, 0.01, 0.002).unwrap();
        assert_eq!(dev.gains(1).unwrap(), GainSlot::default());
        dev.apply_config(false, true).unwrap();
        assert_eq!(dev.gains(1).unwrap(), GainSlot::pidf(0.1, 0.0, 0.01, 0.002));
        assert_eq!(dev.persisted().unwrap().slots[1].p, 0.1);
    }

    #[test]
    fn test_loopback_slot_bounds() {
        let mut dev = LoopbackBackend::new(DeviceFamily::TalonFx, 1);
        let err = dev.configure_gains(3, 1.0, 0.0, 0.0, 0.0).unwrap_err();
        assert_eq!(err, MotorError::UnsupportedSlot { slot: 3, available: 3 });
        assert!(dev.select_gain_slot(2).is_ok());
        assert_eq!(dev.current_gain_slot(), 2);
        assert!(dev.select_gain_slot(7).is_err());
        assert!(dev.gains(5).is_err());
    }

    #[test]
    fn test_loopback_rejects_bad_values() {
        let mut dev = LoopbackBackend::new(DeviceFamily::SparkMax, 1);
        assert!(dev.configure_gains(0, f64::NAN, 0.0, 0.0, 0.0).is_err());
        assert!(dev.configure_profile(0, -1.0, 2.0, 0.1).is_err());
        assert!(dev.configure_profile(0, 1.0, 2.0, f64::INFINITY).is_err());
        assert!(dev.set_conversion_factor(ConversionFactor::position(0.0)).is_err());
        assert!(dev.set_encoder_position(f64::NAN).is_err());
    }

    #[test]
    fn test_loopback_profile_readback() {
        let mut dev = LoopbackBackend::new(DeviceFamily::SparkMax, 1);
        dev.configure_profile(0, 3.0, 6.0, 0.05).unwrap();
        dev.apply_config(false, false).unwrap();
        let profile = dev.gains(0).unwrap().profile.unwrap();
        assert_eq!(profile.max_velocity, 3.0);
        assert_eq!(profile.max_acceleration, 6.0);
        assert!(dev.persisted().is_none());
    }

    #[test]
    fn test_loopback_reset_keeps_staged_config() {
        let mut reset = LoopbackBackend::new(DeviceFamily::SparkMax, 1);
        let mut plain = LoopbackBackend::new(DeviceFamily::SparkMax, 2);
        for dev in [&mut reset, &mut plain] {
            dev.configure_gains(0, 0.5, 0.0, 0.0, 0.0).unwrap();
            dev.set_idle_behavior(IdleMode::Coast).unwrap();
        }

        reset.apply_config(true, false).unwrap();
        plain.apply_config(false, false).unwrap();

        assert_eq!(reset.state().applied, plain.state().applied);
        assert_eq!(reset.gains(0).unwrap().p, 0.5);
        assert_eq!(reset.stats().factory_resets, 1);
        assert_eq!(plain.stats().factory_resets, 0);
    }

    #[test]
    fn test_loopback_apply_stats() {
        let mut dev = LoopbackBackend::new(DeviceFamily::SparkMax, 1);
        dev.apply_config(true, true).unwrap();
        dev.apply_config(false, false).unwrap();
        let stats = dev.stats();
        assert_eq!(stats.config_applies, 2);
        assert_eq!(stats.flash_writes, 1);
        assert_eq!(stats.factory_resets, 1);
    }

    #[test]
    fn test_loopback_injected_failure() {
        let mut dev = LoopbackBackend::new(DeviceFamily::SparkMax, 1);
        dev.fail_next_send("bus off");
        let err = dev.send(ControlMode::PercentOutput, 0.3, 0.0).unwrap_err();
        assert!(matches!(err, MotorError::CommunicationFailed(_)));
        assert_eq!(dev.stats().frames_sent, 0);
        assert!(dev.send(ControlMode::PercentOutput, 0.3, 0.0).is_ok());
    }

    #[test]
    fn test_loopback_clones_share_state() {
        let dev = LoopbackBackend::new(DeviceFamily::SparkMax, 1);
        let mut boxed: Box<dyn HardwareBackend> = Box::new(dev.clone());
        boxed.send(ControlMode::Voltage, 12.0, 0.0).unwrap();
        assert_eq!(dev.stats().frames_sent, 1);
        assert_eq!(
            dev.last_frame(),
            Some(SentFrame { mode: ControlMode::Voltage, demand: 12.0, feedforward: 0.0 })
        );
    }

    #[test]
    fn test_loopback_factory() {
        let factory = LoopbackFactory;
        let dev = factory.create(&DeviceSpec::talon_fx_on(10, "canivore")).unwrap();
        assert_eq!(dev.family(), DeviceFamily::TalonFx);
        assert!(factory.create(&DeviceSpec::spark_max(99)).is_err());
    }

    #[test]
    fn test_loopback_motor_type_from_spec() {
        let brushed = LoopbackBackend::from_spec(&DeviceSpec::spark_flex(3).with_motor_type(MotorType::Brushed)).unwrap();
        assert_eq!(brushed.motor_type(), Some(MotorType::Brushed));
        assert_eq!(LoopbackBackend::new(DeviceFamily::SparkMax, 1).motor_type(), Some(MotorType::Brushless));
        assert_eq!(LoopbackBackend::from_spec(&DeviceSpec::talon_fx(3)).unwrap().motor_type(), None);
    }
}
