//! Builders for well-formed packets of every grammar.

use vnframe::{
    BinaryHeader,
    EnabledMeasurements,
    FbHeader,
    Group,
    protocol::{ascii, fa, fb},
};

/// `$body*HH\r\n` with the 8-bit XOR checksum.
#[must_use]
pub fn ascii_sentence(body: &str) -> Vec<u8> { ascii::frame_with_checksum8(body).into_bytes() }

/// `$body*HHHH\r\n` with the CRC-16 checksum.
#[must_use]
pub fn ascii_sentence_crc(body: &str) -> Vec<u8> { ascii::frame_with_crc(body).into_bytes() }

/// Device echo of `command` (as written, framing included) with `values`
/// appended.
///
/// ```rust
/// use vnframe_testing::response_to;
///
/// let reply = response_to("$VNRRG,05*5A3D\r\n", &["115200"]);
/// assert!(reply.starts_with(b"$VNRRG,05,115200*"));
/// ```
#[must_use]
pub fn response_to(command: &str, values: &[&str]) -> Vec<u8> {
    let body = command
        .trim_start_matches('$')
        .split('*')
        .next()
        .unwrap_or_default();
    let mut reply = body.to_owned();
    for value in values {
        reply.push(',');
        reply.push_str(value);
    }
    ascii_sentence_crc(&reply)
}

/// FA packet carrying `measurements` with `payload` as its field bytes.
#[must_use]
pub fn fa_packet(measurements: EnabledMeasurements, payload: &[u8]) -> Vec<u8> {
    fa::encode(&BinaryHeader::new(measurements), payload)
}

/// FA packet carrying three little-endian floats in the IMU
/// uncompensated-magnetometer field.
#[must_use]
pub fn imu_packet(values: [f32; 3]) -> Vec<u8> {
    let payload: Vec<u8> = values.iter().flat_map(|value| value.to_le_bytes()).collect();
    fa_packet(EnabledMeasurements::new().with(Group::Imu, 1), &payload)
}

/// Split an FA packet into `pieces` FB fragments of message `message_id`.
///
/// The FA sync byte and CRC are stripped and the remainder spread as evenly
/// as possible; every fragment carries its own CRC.
///
/// # Panics
///
/// Panics when `pieces` is zero or above fifteen, or when `packet` is too
/// short to be an FA packet.
#[must_use]
pub fn fb_fragments(packet: &[u8], pieces: u8, message_id: u8) -> Vec<Vec<u8>> {
    assert!((1..=15).contains(&pieces), "fragment count must be 1..=15");
    assert!(packet.len() > 1 + fa::CRC_LEN, "not an FA packet");
    let body = &packet[1..packet.len() - fa::CRC_LEN];
    let chunk = body.len().div_ceil(usize::from(pieces)).max(1);
    let mut chunks: Vec<&[u8]> = body.chunks(chunk).collect();
    chunks.resize(usize::from(pieces), &[]);
    (1..=pieces)
        .zip(chunks)
        .map(|(current, payload)| {
            fb::encode(
                FbHeader {
                    message_type: 0,
                    message_id,
                    total_packet_count: pieces,
                    current_packet_count: current,
                    payload_length: 0,
                },
                payload,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use vnframe::{checksum::crc16, protocol::fb::SYNC};

    use super::{fb_fragments, imu_packet};

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(5)]
    fn fragments_cover_the_packet(#[case] pieces: u8) {
        let packet = imu_packet([1.0, 2.0, 3.0]);
        let fragments = fb_fragments(&packet, pieces, 3);
        assert_eq!(fragments.len(), usize::from(pieces));
        let mut body = Vec::new();
        for fragment in &fragments {
            assert_eq!(fragment[0], SYNC);
            assert_eq!(crc16(&fragment[1..]), 0);
            body.extend_from_slice(&fragment[6..fragment.len() - 2]);
        }
        assert_eq!(body, packet[1..packet.len() - 2]);
    }
}
