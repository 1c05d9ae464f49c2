//! Sensitivity step flow: `input -> ram_selection -> results`.
//!
//! `unlocked` is orthogonal to the step and gates the results view behind the
//! subscribe call-to-action. The only way back from `results` is [`SensiWizard::reset`].

use serde::Serialize;

use crate::device::{DeviceCheck, DeviceValidator};
use crate::error::{SensiError, SensiResult};
use crate::presets::{PresetTable, SensitivitySettings};
use crate::usage::UsageRecorder;

pub const ERR_EMPTY_MODEL: &str = "Please enter your mobile brand and model.";
pub const ERR_IPHONE: &str = "For Iphone Sensi Will Be Updated Soon";
pub const ERR_VERIFY_FAILED: &str = "Failed to verify the device. Please try again.";
pub const ERR_NO_RAM: &str = "Please select a RAM configuration.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Input,
    RamSelection,
    Results,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Input => "input",
            Step::RamSelection => "ram_selection",
            Step::Results => "results",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSettings {
    pub device_specs: String,
    pub fixed_sensitivity: SensitivitySettings,
    pub dpi: String,
}

/// Client-facing snapshot. Generated settings are withheld until unlocked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub step: Step,
    pub mobile_model: String,
    pub device_specs: Option<DeviceCheck>,
    pub ram_options: Vec<String>,
    pub selected_ram: Option<String>,
    pub unlocked: bool,
    pub requires_unlock: bool,
    pub generated_settings: Option<GeneratedSettings>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SensiWizard {
    step: Step,
    mobile_model: String,
    device: Option<DeviceCheck>,
    ram_options: Vec<String>,
    selected_ram: Option<String>,
    generated: Option<GeneratedSettings>,
    unlocked: bool,
    error: Option<String>,
}

impl Default for SensiWizard {
    fn default() -> Self {
        Self {
            step: Step::Input,
            mobile_model: String::new(),
            device: None,
            ram_options: Vec::new(),
            selected_ram: None,
            generated: None,
            unlocked: false,
            error: None,
        }
    }
}

impl SensiWizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generated settings, only once the results step is unlocked.
    pub fn unlocked_settings(&self) -> SensiResult<&GeneratedSettings> {
        self.expect_step(Step::Results)?;
        match &self.generated {
            Some(generated) if self.unlocked => Ok(generated),
            _ => Err(SensiError::InvalidStep {
                expected: "unlocked results",
                actual: "locked results",
            }),
        }
    }

    fn expect_step(&self, expected: Step) -> SensiResult<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(SensiError::InvalidStep {
                expected: expected.as_str(),
                actual: self.step.as_str(),
            })
        }
    }

    fn fail(&mut self, msg: String) -> SensiError {
        self.error = Some(msg.clone());
        SensiError::Validation(msg)
    }

    /// `input -> ram_selection` once the validator accepts the name and offers RAM options.
    /// Empty and iPhone names are rejected without calling the validator.
    pub async fn submit_device(&mut self, model: &str, validator: &dyn DeviceValidator) -> SensiResult<()> {
        self.expect_step(Step::Input)?;
        self.mobile_model = model.to_string();
        let trimmed = model.trim();
        if trimmed.is_empty() {
            return Err(self.fail(ERR_EMPTY_MODEL.to_string()));
        }
        if trimmed.to_lowercase().contains("iphone") {
            return Err(self.fail(ERR_IPHONE.to_string()));
        }
        self.error = None;

        let check = match validator.check_device(trimmed).await {
            Ok(check) => check,
            Err(e) => {
                tracing::error!("[SENSI WIZARD] Error checking device {:?}: {}", trimmed, e);
                return Err(self.fail(ERR_VERIFY_FAILED.to_string()));
            }
        };
        if !check.is_usable() {
            return Err(self.fail(format!(
                "No mobile name found for \"{}\". Please check the spelling and try again.",
                trimmed
            )));
        }

        self.ram_options = check.ram_options.clone();
        self.selected_ram = self.ram_options.first().cloned();
        self.device = Some(check);
        self.step = Step::RamSelection;
        tracing::info!("[SENSI WIZARD] Device accepted: {}", trimmed);
        Ok(())
    }

    /// Pick one of the offered RAM options.
    pub fn select_ram(&mut self, ram: &str) -> SensiResult<()> {
        self.expect_step(Step::RamSelection)?;
        if !self.ram_options.iter().any(|r| r == ram) {
            return Err(self.fail(format!("{} is not an offered RAM option.", ram)));
        }
        self.selected_ram = Some(ram.to_string());
        self.error = None;
        Ok(())
    }

    /// `ram_selection -> results`. The usage increment is best-effort.
    pub async fn generate(&mut self, presets: &PresetTable, usage: &dyn UsageRecorder) -> SensiResult<()> {
        self.expect_step(Step::RamSelection)?;
        let ram = match self.selected_ram.clone() {
            Some(ram) if !ram.is_empty() => ram,
            _ => return Err(self.fail(ERR_NO_RAM.to_string())),
        };
        self.error = None;
        self.generated = None;
        self.unlocked = false;

        let preset = match presets.resolve(&ram) {
            Ok(p) => p,
            Err(_) => {
                return Err(self.fail(format!(
                    "Sorry, no preset sensitivity found for {} RAM.",
                    ram
                )))
            }
        };

        self.generated = Some(GeneratedSettings {
            device_specs: format!(
                "Settings optimized for {} with {} RAM.",
                self.mobile_model.trim(),
                ram
            ),
            fixed_sensitivity: preset.settings,
            dpi: preset.dpi,
        });

        if let Err(e) = usage.record_usage().await {
            tracing::error!("[SENSI WIZARD] Failed to record usage: {}", e);
        }
        self.step = Step::Results;
        Ok(())
    }

    /// Subscribe call-to-action accepted.
    pub fn unlock(&mut self) -> SensiResult<()> {
        self.expect_step(Step::Results)?;
        self.unlocked = true;
        Ok(())
    }

    /// Any step -> input, clearing every derived field.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn view(&self) -> WizardView {
        WizardView {
            step: self.step,
            mobile_model: self.mobile_model.clone(),
            device_specs: self.device.clone(),
            ram_options: self.ram_options.clone(),
            selected_ram: self.selected_ram.clone(),
            unlocked: self.unlocked,
            requires_unlock: self.step == Step::Results && !self.unlocked,
            generated_settings: if self.unlocked {
                self.generated.clone()
            } else {
                None
            },
            error: self.error.clone(),
        }
    }
}
