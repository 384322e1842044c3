/*++

Licensed under the Apache-2.0 license.

File Name:

    dtb.rs

Abstract:

    File contains a minimal flattened device tree writer for boot configuration tests.

--*/

const FDT_MAGIC: u32 = 0xd00d_feed;
const FDT_BEGIN_NODE: u32 = 0x1;
const FDT_END_NODE: u32 = 0x2;
const FDT_PROP: u32 = 0x3;
const FDT_END: u32 = 0x9;

const HEADER_LEN: usize = 40;
const RSVMAP_LEN: usize = 16;

/// Builds a version 17 blob. The root node is opened by `new` and closed by
/// `build`.
pub struct DtbBuilder {
    structure: Vec<u8>,
    strings: Vec<u8>,
    depth: usize,
}

impl Default for DtbBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DtbBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            structure: Vec::new(),
            strings: Vec::new(),
            depth: 0,
        };
        builder
            .begin_node("")
            .prop_u32("#address-cells", 1)
            .prop_u32("#size-cells", 1);
        builder
    }

    fn push_u32(&mut self, val: u32) {
        self.structure.extend_from_slice(&val.to_be_bytes());
    }

    fn pad(&mut self) {
        while self.structure.len() % 4 != 0 {
            self.structure.push(0);
        }
    }

    fn string_offset(&mut self, name: &str) -> u32 {
        let mut offset = 0;
        for s in self.strings.split(|b| *b == 0) {
            if s == name.as_bytes() && offset < self.strings.len() {
                return offset as u32;
            }
            offset += s.len() + 1;
        }
        let offset = self.strings.len();
        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        offset as u32
    }

    pub fn begin_node(&mut self, name: &str) -> &mut Self {
        self.push_u32(FDT_BEGIN_NODE);
        self.structure.extend_from_slice(name.as_bytes());
        self.structure.push(0);
        self.pad();
        self.depth += 1;
        self
    }

    pub fn end_node(&mut self) -> &mut Self {
        self.push_u32(FDT_END_NODE);
        self.depth -= 1;
        self
    }

    pub fn prop(&mut self, name: &str, value: &[u8]) -> &mut Self {
        let nameoff = self.string_offset(name);
        self.push_u32(FDT_PROP);
        self.push_u32(value.len() as u32);
        self.push_u32(nameoff);
        self.structure.extend_from_slice(value);
        self.pad();
        self
    }

    pub fn prop_u32(&mut self, name: &str, value: u32) -> &mut Self {
        self.prop(name, &value.to_be_bytes())
    }

    pub fn prop_empty(&mut self, name: &str) -> &mut Self {
        self.prop(name, &[])
    }

    pub fn build(&mut self) -> Vec<u8> {
        while self.depth > 0 {
            self.end_node();
        }
        self.push_u32(FDT_END);

        let off_struct = HEADER_LEN + RSVMAP_LEN;
        let off_strings = off_struct + self.structure.len();
        let total = off_strings + self.strings.len();
        let header = [
            FDT_MAGIC,
            total as u32,
            off_struct as u32,
            off_strings as u32,
            HEADER_LEN as u32,
            17,
            16,
            0,
            self.strings.len() as u32,
            self.structure.len() as u32,
        ];

        let mut blob = Vec::with_capacity(total);
        for word in header {
            blob.extend_from_slice(&word.to_be_bytes());
        }
        blob.extend_from_slice(&[0u8; RSVMAP_LEN]);
        blob.extend_from_slice(&self.structure);
        blob.extend_from_slice(&self.strings);
        blob
    }
}
