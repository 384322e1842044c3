// Licensed under the Apache-2.0 license

mod common;

use common::*;
use te_error::TeeStatus;
use te_runtime::{service_name, AdimemCmd, TeeParam, Uuid, SERVICES};

#[test]
fn test_unknown_service() {
    let soc = single_tile();
    let mut drivers = new_drivers(&soc);
    let uuid = Uuid::new(0x1234_5678, 0x9abc, 0xdef0, [0; 8]);
    let mut params: [TeeParam; 4] = Default::default();

    assert_eq!(invoke(&mut drivers, uuid, 0, &mut params), TeeStatus::BadParameters);
    assert!(log_text(&drivers).contains("No service for 12345678-9abc-def0-0000-000000000000"));
    assert_eq!(service_name(&uuid), None);
}

#[test]
fn test_services_are_distinct() {
    for (i, (uuid, name)) in SERVICES.iter().enumerate() {
        assert_eq!(service_name(uuid), Some(*name));
        assert!(SERVICES[i + 1..].iter().all(|(other, _)| other != uuid));
    }
    assert_eq!(service_name(&AdimemCmd::UUID), Some("adimem.ta"));
}

#[test]
fn test_status_codes() {
    assert_eq!(u32::from(TeeStatus::Success), 0);
    assert_eq!(u32::from(TeeStatus::AccessDenied), 0xffff_0001);
    assert_eq!(u32::from(TeeStatus::BadParameters), 0xffff_0006);
    assert_eq!(u32::from(TeeStatus::BadState), 0xffff_0007);
}
