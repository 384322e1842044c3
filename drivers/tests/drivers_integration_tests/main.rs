// Licensed under the Apache-2.0 license

use te_drivers::{
    ApiId, ChallengeType, EnclaveError, HostKey, HostKeyId, Lifecycle, PlatformConfig, Tile,
    HW_UNIQUE_KEY_LENGTH, TE_RESPONSE_TIMEOUT_US, UNWRAPPED_KEY_LEN, WRAPPED_KEY_LEN,
};
use te_emu_periph::{
    model_unwrap, DtbBuilder, EmuSoc, ProvisionedKey, ResponseMode, STATUS_BUFFER_TOO_SMALL,
};
use te_error::TeError;

fn single_tile() -> EmuSoc {
    EmuSoc::builder().build().unwrap()
}

#[test]
fn test_config_from_device_tree() {
    let blob = DtbBuilder::new()
        .begin_node("boot")
        .prop_u32("dual-tile", 1)
        .prop_u32("secondary-linux-enabled", 1)
        .prop_u32("anti-rollback-counter", 3)
        .prop_u32("te-anti-rollback-counter", 2)
        .prop_empty("bootrom_bypass")
        .end_node()
        .begin_node("sysclk")
        .prop_u32("clock-frequency", 125_000_000)
        .end_node()
        .build();

    let config = PlatformConfig::from_fdt(&blob).unwrap();
    assert!(config.dual_tile);
    assert!(config.secondary_linux_enabled);
    assert_eq!(config.anti_rollback_counter, 3);
    assert_eq!(config.te_anti_rollback_counter, 2);
    assert!(config.bootrom_bypass);
    assert_eq!(config.sysclk_freq, 125_000_000);
}

#[test]
fn test_config_missing_nodes() {
    let blob = DtbBuilder::new().begin_node("chosen").end_node().build();
    let config = PlatformConfig::from_fdt(&blob).unwrap();
    assert!(!config.dual_tile);
    assert!(!config.bootrom_bypass);
    assert_eq!(config.sysclk_freq, 0);
}

#[test]
fn test_output_operations() {
    let soc = single_tile();
    let mut enclave = soc.enclave();

    let mut out = [0u8; 32];
    let len = enclave.get_enclave_version(Tile::Primary, &mut out).unwrap();
    assert_eq!(&out[..len], b"te-fw 1.4.2");

    let len = enclave.get_serial_number(Tile::Primary, &mut out).unwrap();
    assert_eq!(&out[..len], &[0x53, 0x4e, 0x00, 0x00, 0x12, 0x34, 0x56, 0x78]);

    let len = enclave.get_device_identity(Tile::Primary, &mut out).unwrap();
    assert_eq!(len, 32);
    assert_eq!(out[31], 31);

    assert_eq!(
        soc.primary().request_ids(),
        vec![
            ApiId::GetEnclaveVersion as u32,
            ApiId::GetSerialNumber as u32,
            ApiId::GetDeviceIdentity as u32,
        ]
    );
    assert_eq!(soc.primary().acks(), 3);
    assert!(soc.dcache.cleans() >= 3);
    assert!(soc.dcache.invalidates() >= 3);
}

#[test]
fn test_output_too_small() {
    let soc = single_tile();
    let mut enclave = soc.enclave();
    let mut out = [0u8; 4];
    let err = enclave
        .get_enclave_version(Tile::Primary, &mut out)
        .unwrap_err();
    assert_eq!(err.code(), STATUS_BUFFER_TOO_SMALL);
}

#[test]
fn test_reported_length_overflow() {
    let soc = single_tile();
    soc.primary().model.reported_len = Some(64);
    let mut enclave = soc.enclave();
    let mut out = [0u8; 32];
    assert_eq!(
        enclave.get_api_version(Tile::Primary, &mut out),
        Err(EnclaveError::Host(TeError::DRIVER_ENCLAVE_LENGTH_OVERFLOW))
    );
}

#[test]
fn test_response_timeout() {
    let soc = EmuSoc::builder()
        .response(ResponseMode::Never)
        .timer_step_us(100_000)
        .build()
        .unwrap();
    let mut enclave = soc.enclave();
    assert_eq!(
        enclave.get_mailbox_version(Tile::Primary),
        Err(EnclaveError::Host(TeError::DRIVER_MAILBOX_TIMEOUT))
    );
    assert!(soc.timer.elapsed_us() >= TE_RESPONSE_TIMEOUT_US);
    assert_eq!(soc.primary().acks(), 0);
}

#[test]
fn test_no_secondary() {
    let soc = single_tile();
    let mut enclave = soc.enclave();
    assert!(!enclave.has_secondary());
    assert_eq!(
        enclave.get_antirollback(Tile::Secondary),
        Err(EnclaveError::Host(TeError::DRIVER_MAILBOX_NO_SECONDARY))
    );
    assert_eq!(
        enclave.get_lifecycle_state(Tile::Secondary),
        Err(TeError::DRIVER_MAILBOX_NO_SECONDARY)
    );
    assert!(soc.primary().requests().is_empty());
}

#[test]
fn test_enclave_status() {
    let soc = single_tile();
    soc.primary().model.fail(ApiId::ProvisionFinalize, 0x21);
    let mut enclave = soc.enclave();
    let err = enclave.provision_finalize(Tile::Primary).unwrap_err();
    assert_eq!(err.code(), 0x21);
    assert_eq!(TeError::from(err), TeError::DRIVER_ENCLAVE_STATUS);
}

#[test]
fn test_antirollback() {
    let soc = single_tile();
    soc.primary().model.antirollback = 4;
    let mut enclave = soc.enclave();
    assert_eq!(enclave.get_antirollback(Tile::Primary), Ok(4));
    assert_eq!(enclave.increment_antirollback(Tile::Primary), Ok(5));
    assert_eq!(enclave.increment_antirollback(Tile::Primary), Ok(6));
    assert_eq!(soc.primary().model.antirollback_increments, 2);
}

#[test]
fn test_lifecycle_and_boot_flow() {
    let soc = single_tile();
    soc.primary().model.set_lifecycle(Lifecycle::Cust1ProvHost);
    soc.primary().model.boot_flow1 = 0xabcd;
    let enclave = soc.enclave();
    assert_eq!(
        enclave.get_lifecycle_state(Tile::Primary),
        Ok(Lifecycle::Cust1ProvHost)
    );
    assert_eq!(enclave.get_boot_flow1(Tile::Primary), Ok(0xabcd));
}

#[test]
fn test_provision_host_keys() {
    let soc = EmuSoc::builder().dual_tile(true).build().unwrap();
    let mut enclave = soc.enclave();
    let boot_key = [0x11u8; 32];
    let ipk = [0x22u8; 16];
    let keys = [
        HostKey {
            id: HostKeyId::SecBoot,
            key: &boot_key,
        },
        HostKey {
            id: HostKeyId::Ipk,
            key: &ipk,
        },
    ];
    enclave.provision_host_keys(Tile::Secondary, &keys).unwrap();
    assert_eq!(
        soc.secondary().unwrap().model.provisioned_keys,
        vec![
            ProvisionedKey {
                id: HostKeyId::SecBoot as u32,
                key: boot_key.to_vec(),
            },
            ProvisionedKey {
                id: HostKeyId::Ipk as u32,
                key: ipk.to_vec(),
            },
        ]
    );
    assert!(soc.primary().model.provisioned_keys.is_empty());
}

#[test]
fn test_hw_unique_key() {
    let soc = single_tile();
    let mut enclave = soc.enclave();
    let huk = enclave.get_hw_unique_key(false).map(|key| key.0);
    let expected: Vec<u8> = (0xa0..0xb0).collect();
    assert_eq!(huk.as_ref().map(|key| key.as_slice()), Ok(expected.as_slice()));
    assert_eq!(enclave.buf().cursor(), 0);

    assert_eq!(
        enclave.get_hw_unique_key(true).map(|key| key.0),
        Err(TeError::DRIVER_ENCLAVE_BOOTROM_BYPASS)
    );

    soc.primary().model.huk = vec![0; HW_UNIQUE_KEY_LENGTH - 1];
    assert_eq!(
        enclave.get_hw_unique_key(false).map(|key| key.0),
        Err(TeError::DRIVER_ENCLAVE_HUK_LENGTH)
    );
}

#[test]
fn test_unwrap_and_challenge() {
    let soc = single_tile();
    let mut enclave = soc.enclave();

    let wrapped: Vec<u8> = (0..WRAPPED_KEY_LEN as u8).collect();
    let mut unwrapped = [0u8; UNWRAPPED_KEY_LEN];
    let len = enclave
        .unwrap_cust_key(Tile::Primary, &wrapped, &mut unwrapped)
        .unwrap();
    assert_eq!(&unwrapped[..len], model_unwrap(&wrapped).as_slice());

    let mut challenge = [0u8; 32];
    let len = enclave
        .request_challenge(Tile::Primary, ChallengeType::SecureDebug, &mut challenge)
        .unwrap();
    assert_eq!(&challenge[..len], &[0xc4; 32]);
    assert_eq!(
        soc.primary().model.last_challenge_type,
        Some(ChallengeType::SecureDebug as u32)
    );
}

#[test]
fn test_random_bytes() {
    let soc = single_tile();
    let mut enclave = soc.enclave();
    let mut out = [0u8; 4];
    enclave.random_bytes(Tile::Primary, &mut out).unwrap();
    assert_eq!(out, [0x42, 0x43, 0x44, 0x45]);
    assert_eq!(enclave.hw_get_random_byte(), 0x46);
}
