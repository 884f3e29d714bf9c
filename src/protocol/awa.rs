/// Append an AWA frame (HyperSerialPico format) for `pixel_data` to `frame`
pub fn write_awa_frame(pixel_data: &[u8], stride: usize, frame: &mut Vec<u8>) {
    let led_count = pixel_data.len() / stride.max(1);

    // AWA header: 'Awa' + (LED count - 1) high + low + CRC
    let last = led_count.saturating_sub(1);
    let count_hi = (last >> 8) as u8;
    let count_lo = last as u8;
    let crc = (count_hi ^ count_lo) ^ 0x55;

    frame.reserve(6 + pixel_data.len() + 3);
    frame.extend_from_slice(b"Awa");
    frame.extend_from_slice(&[count_hi, count_lo, crc]);
    frame.extend_from_slice(pixel_data);

    // Fletcher checksums as computed by the HyperSerialPico firmware
    let mut fletcher1: u16 = 0;
    let mut fletcher2: u16 = 0;
    let mut fletcher_ext: u16 = 0;

    for (position, &byte) in pixel_data.iter().enumerate() {
        fletcher1 = (fletcher1 + byte as u16) % 255;
        fletcher2 = (fletcher2 + fletcher1) % 255;
        fletcher_ext = (fletcher_ext + ((byte as u16) ^ (position as u16))) % 255;
    }

    // 'A' would look like the start of a new header
    if fletcher_ext == 0x41 {
        fletcher_ext = 0xaa;
    }

    frame.extend_from_slice(&[fletcher1 as u8, fletcher2 as u8, fletcher_ext as u8]);
}
