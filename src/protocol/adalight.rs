/// Append an Adalight frame for `pixel_data` to `frame`
pub fn write_adalight_frame(pixel_data: &[u8], stride: usize, frame: &mut Vec<u8>) {
    let led_count = pixel_data.len() / stride.max(1);

    // Adalight header: 'Ada' + LED count high + low + checksum
    let count_hi = (led_count >> 8) as u8;
    let count_lo = led_count as u8;
    let checksum = count_hi ^ count_lo ^ 0x55;

    frame.reserve(6 + pixel_data.len());
    frame.extend_from_slice(b"Ada");
    frame.extend_from_slice(&[count_hi, count_lo, checksum]);
    frame.extend_from_slice(pixel_data);
}
