//! # CRC-8/DVB-S2
//!
//! Checksum carried at the end of every modem link envelope.
//!
//! **Polynomial**: 0xD5, **Initial Value**: 0x00, no reflection, no final XOR

const CRC8_POLY: u8 = 0xD5;

const CRC8_TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;

        while bit < 8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ CRC8_POLY } else { crc << 1 };
            bit += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Checksum of `data` (envelope length byte through the last payload byte)
pub fn crc8_dvb_s2(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |crc, &byte| CRC8_TABLE[(crc ^ byte) as usize])
}
