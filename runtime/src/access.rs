/*++

Licensed under the Apache-2.0 license.

File Name:

    access.rs

Abstract:

    File contains the access-control tables and the gate evaluated before
    any proxied hardware access.

--*/

bitflags::bitflags! {
    /// Operations an access-table entry grants.
    pub struct Rights: u8 {
        const READ = 0b001;
        const WRITE = 0b010;
        /// Combined write-then-read on one register window.
        const WRITE_READ = 0b100;
    }
}

/// A memory-proxy resource: register address plus access size in bits.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MemKey {
    pub address: u32,
    pub size: u32,
}

/// An I2C register window on one slave.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct I2cKey {
    pub bus: u64,
    pub slave: u64,
    pub address: u64,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AccessEntry<K> {
    pub key: K,
    pub rights: Rights,
}

impl<K> AccessEntry<K> {
    pub const fn new(key: K, rights: Rights) -> Self {
        Self { key, rights }
    }
}

/// The first entry whose key matches decides. No match denies.
pub fn authorize<K: PartialEq>(table: &[AccessEntry<K>], key: &K, op: Rights) -> bool {
    table
        .iter()
        .find(|entry| entry.key == *key)
        .map_or(false, |entry| entry.rights.contains(op))
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Denial {
    NotPermitted,
    /// Privilege was requested for an access the table already grants.
    UnnecessaryPrivilege,
}

/// Table decision combined with the debug privilege override.
pub fn authorize_privileged<K: PartialEq>(
    table: &[AccessEntry<K>],
    key: &K,
    op: Rights,
    privileged: bool,
) -> Result<(), Denial> {
    match (authorize(table, key, op), privileged) {
        (true, true) => Err(Denial::UnnecessaryPrivilege),
        (true, false) | (false, true) => Ok(()),
        (false, false) => Err(Denial::NotPermitted),
    }
}

/// A block of registers exported by the memory-dump service.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MemdumpRecord {
    pub addr: u32,
    /// Size in bytes.
    pub size: u32,
    /// Access width in bits.
    pub width: u32,
    pub little_endian: bool,
}

impl MemdumpRecord {
    pub const fn new(addr: u32, size: u32, width: u32) -> Self {
        Self {
            addr,
            size,
            width,
            little_endian: true,
        }
    }

    pub fn endianness(&self) -> u32 {
        if self.little_endian {
            0
        } else {
            1
        }
    }
}

/// Addresses never read by the memory dump. Both ends are included.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ExcludedRange {
    pub start: u32,
    pub end: u32,
}

impl ExcludedRange {
    pub fn contains(&self, addr: u32) -> bool {
        (self.start..=self.end).contains(&addr)
    }
}

/// Bits cleared from the value read at `address`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BitFieldExclusion {
    pub address: u32,
    pub mask: u64,
}

pub const ADIMEM_TABLE: [AccessEntry<MemKey>; 5] = [
    AccessEntry::new(MemKey { address: 0x1829_1658, size: 8 }, Rights::READ),
    AccessEntry::new(MemKey { address: 0x1829_1664, size: 8 }, Rights::READ),
    AccessEntry::new(
        MemKey { address: 0x2010_3100, size: 32 },
        Rights::READ.union(Rights::WRITE),
    ),
    AccessEntry::new(
        MemKey { address: 0x2010_3104, size: 32 },
        Rights::READ.union(Rights::WRITE),
    ),
    AccessEntry::new(MemKey { address: 0x2010_3108, size: 32 }, Rights::READ),
];

const fn i2c_key(slave: u64, address: u64) -> I2cKey {
    I2cKey {
        bus: 0,
        slave,
        address,
    }
}

const I2C_WRITE: Rights = Rights::WRITE.union(Rights::WRITE_READ);

pub const I2C_TABLE: [AccessEntry<I2cKey>; 14] = [
    AccessEntry::new(i2c_key(0x41, 0xe8), Rights::READ),
    AccessEntry::new(i2c_key(0x41, 0xe7), Rights::READ),
    AccessEntry::new(i2c_key(0x41, 0xf0), I2C_WRITE),
    AccessEntry::new(i2c_key(0x41, 0xf1), I2C_WRITE),
    AccessEntry::new(i2c_key(0x24, 0x88), Rights::READ),
    AccessEntry::new(i2c_key(0x24, 0x8b), Rights::READ),
    AccessEntry::new(i2c_key(0x24, 0x8c), Rights::READ),
    AccessEntry::new(i2c_key(0x24, 0x7a), Rights::READ),
    AccessEntry::new(i2c_key(0x24, 0x7b), Rights::READ),
    AccessEntry::new(i2c_key(0x25, 0x88), Rights::READ),
    AccessEntry::new(i2c_key(0x25, 0x8b), Rights::READ),
    AccessEntry::new(i2c_key(0x25, 0x8c), Rights::READ),
    AccessEntry::new(i2c_key(0x25, 0x7a), Rights::READ),
    AccessEntry::new(i2c_key(0x25, 0x7b), Rights::READ),
];

pub const MEMDUMP_PRIMARY: [MemdumpRecord; 2] = [
    MemdumpRecord::new(0x2010_3100, 16, 32),
    MemdumpRecord::new(0x2010_3110, 8, 16),
];

pub const MEMDUMP_SECONDARY: [MemdumpRecord; 1] = [MemdumpRecord::new(0x2410_3100, 16, 32)];

pub const MEMDUMP_EXCLUDED: [ExcludedRange; 1] = [ExcludedRange {
    start: 0x2010_3108,
    end: 0x2010_310b,
}];

pub const MEMDUMP_BIT_FIELDS: [BitFieldExclusion; 1] = [BitFieldExclusion {
    address: 0x2010_3104,
    mask: 0xff00_0000,
}];

/// Every table the proxy services consult. Assembled once at startup.
#[derive(Debug, Copy, Clone)]
pub struct AccessTables<'t> {
    pub adimem: &'t [AccessEntry<MemKey>],
    pub i2c: &'t [AccessEntry<I2cKey>],
    pub memdump_primary: &'t [MemdumpRecord],
    pub memdump_secondary: &'t [MemdumpRecord],
    pub memdump_excluded: &'t [ExcludedRange],
    pub memdump_bit_fields: &'t [BitFieldExclusion],
}

impl Default for AccessTables<'static> {
    fn default() -> Self {
        Self {
            adimem: &ADIMEM_TABLE,
            i2c: &I2C_TABLE,
            memdump_primary: &MEMDUMP_PRIMARY,
            memdump_secondary: &MEMDUMP_SECONDARY,
            memdump_excluded: &MEMDUMP_EXCLUDED,
            memdump_bit_fields: &MEMDUMP_BIT_FIELDS,
        }
    }
}

impl<'t> AccessTables<'t> {
    /// Starts from the shipped tables.
    pub fn builder() -> AccessTablesBuilder<'t> {
        let tables: AccessTables<'static> = AccessTables::default();
        AccessTablesBuilder { tables }
    }

    /// Records visible through the memory dump. The secondary list only
    /// exists on dual-tile systems.
    pub fn memdump_record(&self, index: u32, dual_tile: bool) -> Option<&'t MemdumpRecord> {
        let index = index as usize;
        let primary = self.memdump_primary;
        match primary.get(index) {
            Some(record) => Some(record),
            None if dual_tile => self.memdump_secondary.get(index - primary.len()),
            None => None,
        }
    }

    pub fn memdump_count(&self, dual_tile: bool) -> u32 {
        let mut count = self.memdump_primary.len();
        if dual_tile {
            count += self.memdump_secondary.len();
        }
        count as u32
    }

    pub fn is_excluded(&self, addr: u32) -> bool {
        self.memdump_excluded.iter().any(|range| range.contains(addr))
    }

    /// Combined mask of bits to clear at `addr`.
    pub fn bit_field_mask(&self, addr: u32) -> u64 {
        self.memdump_bit_fields
            .iter()
            .filter(|field| field.address == addr)
            .fold(0, |mask, field| mask | field.mask)
    }
}

pub struct AccessTablesBuilder<'t> {
    tables: AccessTables<'t>,
}

impl<'t> AccessTablesBuilder<'t> {
    pub fn adimem(mut self, table: &'t [AccessEntry<MemKey>]) -> Self {
        self.tables.adimem = table;
        self
    }

    pub fn i2c(mut self, table: &'t [AccessEntry<I2cKey>]) -> Self {
        self.tables.i2c = table;
        self
    }

    pub fn memdump(mut self, primary: &'t [MemdumpRecord], secondary: &'t [MemdumpRecord]) -> Self {
        self.tables.memdump_primary = primary;
        self.tables.memdump_secondary = secondary;
        self
    }

    pub fn memdump_excluded(mut self, ranges: &'t [ExcludedRange]) -> Self {
        self.tables.memdump_excluded = ranges;
        self
    }

    pub fn memdump_bit_fields(mut self, fields: &'t [BitFieldExclusion]) -> Self {
        self.tables.memdump_bit_fields = fields;
        self
    }

    pub fn build(self) -> AccessTables<'t> {
        self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_denies() {
        let key = MemKey {
            address: 0x2010_3100,
            size: 16,
        };
        assert!(!authorize(&ADIMEM_TABLE, &key, Rights::READ));
    }

    #[test]
    fn test_insufficient_rights_denies() {
        let key = MemKey {
            address: 0x2010_3108,
            size: 32,
        };
        assert!(authorize(&ADIMEM_TABLE, &key, Rights::READ));
        assert!(!authorize(&ADIMEM_TABLE, &key, Rights::WRITE));
    }

    #[test]
    fn test_first_match_decides() {
        let key = MemKey {
            address: 0x10,
            size: 8,
        };
        let table = [
            AccessEntry::new(key, Rights::READ),
            AccessEntry::new(key, Rights::all()),
        ];
        assert!(!authorize(&table, &key, Rights::WRITE));
    }

    #[test]
    fn test_privileged_override() {
        let granted = MemKey {
            address: 0x1829_1658,
            size: 8,
        };
        let unlisted = MemKey {
            address: 0x1829_0000,
            size: 8,
        };
        assert_eq!(
            authorize_privileged(&ADIMEM_TABLE, &granted, Rights::READ, true),
            Err(Denial::UnnecessaryPrivilege)
        );
        assert_eq!(
            authorize_privileged(&ADIMEM_TABLE, &unlisted, Rights::WRITE, true),
            Ok(())
        );
        assert_eq!(
            authorize_privileged(&ADIMEM_TABLE, &unlisted, Rights::READ, false),
            Err(Denial::NotPermitted)
        );
    }

    #[test]
    fn test_i2c_combined_right_is_separate() {
        assert!(authorize(&I2C_TABLE, &i2c_key(0x41, 0xf0), Rights::WRITE_READ));
        assert!(!authorize(&I2C_TABLE, &i2c_key(0x41, 0xe8), Rights::WRITE_READ));
        assert!(!authorize(&I2C_TABLE, &i2c_key(0x41, 0xf0), Rights::READ));
        let other_bus = I2cKey {
            bus: 1,
            slave: 0x41,
            address: 0xe8,
        };
        assert!(!authorize(&I2C_TABLE, &other_bus, Rights::READ));
    }

    #[test]
    fn test_memdump_records_follow_tile_count() {
        let tables = AccessTables::default();
        assert_eq!(tables.memdump_count(false), 2);
        assert_eq!(tables.memdump_count(true), 3);
        assert!(tables.memdump_record(2, false).is_none());
        assert_eq!(
            tables.memdump_record(2, true).map(|r| r.addr),
            Some(0x2410_3100)
        );
        assert!(tables.memdump_record(3, true).is_none());
    }

    #[test]
    fn test_redaction_lookup() {
        let tables = AccessTables::default();
        assert!(tables.is_excluded(0x2010_3108));
        assert!(tables.is_excluded(0x2010_310b));
        assert!(!tables.is_excluded(0x2010_310c));
        assert_eq!(tables.bit_field_mask(0x2010_3104), 0xff00_0000);
        assert_eq!(tables.bit_field_mask(0x2010_3100), 0);
    }

    #[test]
    fn test_builder_overrides() {
        static RECORDS: [MemdumpRecord; 1] = [MemdumpRecord::new(0x100, 4, 32)];
        let tables = AccessTables::builder().memdump(&RECORDS, &[]).build();
        assert_eq!(tables.memdump_count(true), 1);
        assert_eq!(tables.adimem.len(), ADIMEM_TABLE.len());
    }
}
