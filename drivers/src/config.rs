/*++

Licensed under the Apache-2.0 license.

File Name:

    config.rs

Abstract:

    File contains the boot-time platform configuration read from the device tree.

--*/
use fdt::Fdt;
use te_error::{TeError, TeResult};

/// Whether a caller-supplied privilege flag may bypass the access tables.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PrivilegePolicy {
    Production,
    Debug,
}

impl Default for PrivilegePolicy {
    fn default() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(feature = "debug")] {
                Self::Debug
            } else {
                Self::Production
            }
        }
    }
}

/// Values cached at boot. The device tree is gone by the time services run.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct PlatformConfig {
    pub dual_tile: bool,
    pub secondary_linux_enabled: bool,
    pub sysclk_freq: u32,
    pub anti_rollback_counter: u32,
    pub te_anti_rollback_counter: u32,
    pub bootrom_bypass: bool,
    pub privilege: PrivilegePolicy,
}

impl PlatformConfig {
    /// Parses a flattened device tree blob.
    ///
    /// Missing nodes or properties leave the default in place. Only a blob
    /// that is not a device tree at all is an error.
    pub fn from_fdt(blob: &[u8]) -> TeResult<Self> {
        let fdt = Fdt::new(blob).map_err(|_| TeError::DRIVER_CONFIG_INVALID_FDT)?;
        let mut config = Self::default();

        if let Some(boot) = fdt.find_node("/boot") {
            let value = |name: &str| {
                boot.property(name)
                    .and_then(|prop| prop.as_usize())
                    .map(|val| val as u32)
            };
            config.dual_tile = value("dual-tile") == Some(1);
            config.secondary_linux_enabled = value("secondary-linux-enabled") == Some(1);
            config.anti_rollback_counter = value("anti-rollback-counter").unwrap_or(0);
            config.te_anti_rollback_counter = value("te-anti-rollback-counter").unwrap_or(0);
            config.bootrom_bypass = boot.property("bootrom_bypass").is_some();
        }

        if let Some(sysclk) = fdt.find_node("/sysclk") {
            config.sysclk_freq = sysclk
                .property("clock-frequency")
                .and_then(|prop| prop.as_usize())
                .map_or(0, |val| val as u32);
        }

        Ok(config)
    }

    pub fn with_privilege_policy(mut self, privilege: PrivilegePolicy) -> Self {
        self.privilege = privilege;
        self
    }

    pub fn is_debug_privilege(&self) -> bool {
        self.privilege == PrivilegePolicy::Debug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlatformConfig::default();
        assert!(!config.dual_tile);
        assert!(!config.bootrom_bypass);
        assert_eq!(config.sysclk_freq, 0);
        assert_eq!(
            config.privilege,
            if cfg!(feature = "debug") {
                PrivilegePolicy::Debug
            } else {
                PrivilegePolicy::Production
            }
        );
    }

    #[test]
    fn test_not_a_device_tree() {
        assert_eq!(
            PlatformConfig::from_fdt(&[0u8; 64]),
            Err(TeError::DRIVER_CONFIG_INVALID_FDT)
        );
    }

    #[test]
    fn test_privilege_override() {
        let config = PlatformConfig::default().with_privilege_policy(PrivilegePolicy::Debug);
        assert!(config.is_debug_privilege());
    }
}
