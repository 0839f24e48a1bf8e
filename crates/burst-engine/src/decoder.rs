//! 프레임 디코더: 이더넷 프레임에서 IPv4 목적지 주소 추출
//!
//! 링크 계층은 VLAN 태그 없는 고정 14바이트 이더넷 헤더로 가정합니다.
//!
//! # 메모리 레이아웃
//! ```text
//! offset  field
//! 0       ethernet dst/src/type   14
//! 14      ip version/ihl          1
//! ...
//! 30      ip dst                  4
//! ```

use std::net::Ipv4Addr;

use inbursts_core::error::DecodeError;
use inbursts_core::types::CapturedFrame;

/// 이더넷 II 헤더 길이
pub const ETHERNET_HEADER_LEN: usize = 14;

/// 유효한 IPv4 헤더의 최소 길이
pub const MIN_IPV4_HEADER_LEN: usize = 20;

/// IPv4 헤더 내 목적지 주소 오프셋
const IPV4_DST_OFFSET: usize = 16;

/// 디코딩된 패킷 (한 프레임 처리 동안만 존재)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedPacket {
    /// IPv4 목적지 주소
    pub destination: Ipv4Addr,
    /// IHL 필드로 계산한 헤더 길이 (바이트)
    pub header_len: usize,
    /// 캡처 장치가 보고한 전체 프레임 길이
    pub frame_len: u32,
}

/// 캡처된 프레임을 디코딩합니다.
///
/// 헤더 길이가 20바이트 미만이거나 캡처된 바이트가 최소 헤더를 담지 못하면
/// 에러를 반환하며, 호출자는 부수 효과 없이 프레임을 버려야 합니다.
pub fn decode_frame(frame: &CapturedFrame<'_>) -> Result<DecodedPacket, DecodeError> {
    let required = ETHERNET_HEADER_LEN + MIN_IPV4_HEADER_LEN;
    let Some(ip) = frame.data.get(ETHERNET_HEADER_LEN..required) else {
        return Err(DecodeError::Truncated {
            len: frame.data.len(),
            required,
        });
    };

    let header_len = usize::from(ip[0] & 0x0f) * 4;
    if header_len < MIN_IPV4_HEADER_LEN {
        return Err(DecodeError::InvalidHeaderLength { header_len });
    }

    let destination = Ipv4Addr::new(
        ip[IPV4_DST_OFFSET],
        ip[IPV4_DST_OFFSET + 1],
        ip[IPV4_DST_OFFSET + 2],
        ip[IPV4_DST_OFFSET + 3],
    );

    Ok(DecodedPacket {
        destination,
        header_len,
        frame_len: frame.wire_len,
    })
}

/// 테스트/벤치마크용 이더넷 + IPv4 프레임 바이트를 생성합니다.
///
/// `ihl`은 4비트 헤더 길이 필드 값(32비트 워드 수)입니다.
pub fn build_ipv4_frame(src: Ipv4Addr, dst: Ipv4Addr, ihl: u8) -> Vec<u8> {
    let mut frame = vec![0u8; ETHERNET_HEADER_LEN + MIN_IPV4_HEADER_LEN];
    // EtherType 0x0800 (IPv4)
    frame[12] = 0x08;
    frame[13] = 0x00;

    let ip = &mut frame[ETHERNET_HEADER_LEN..];
    ip[0] = 0x40 | (ihl & 0x0f);
    ip[8] = 64; // TTL
    ip[9] = 6; // TCP
    ip[12..16].copy_from_slice(&src.octets());
    ip[16..20].copy_from_slice(&dst.octets());
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use inbursts_core::types::CaptureTimestamp;

    fn captured(data: &[u8], wire_len: u32) -> CapturedFrame<'_> {
        CapturedFrame {
            timestamp: CaptureTimestamp::new(1, 0),
            wire_len,
            data,
        }
    }

    #[test]
    fn decodes_destination_and_wire_length() {
        let bytes = build_ipv4_frame(
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(192, 168, 1, 20),
            5,
        );
        let packet = decode_frame(&captured(&bytes, 1514)).unwrap();

        assert_eq!(packet.destination, Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(packet.header_len, 20);
        // snaplen으로 잘린 바이트가 아니라 와이어 길이를 사용
        assert_eq!(packet.frame_len, 1514);
    }

    #[test]
    fn accepts_header_with_options() {
        let bytes = build_ipv4_frame(Ipv4Addr::LOCALHOST, Ipv4Addr::new(10, 1, 1, 1), 15);
        let packet = decode_frame(&captured(&bytes, 120)).unwrap();
        assert_eq!(packet.header_len, 60);
    }

    #[test]
    fn rejects_header_length_below_minimum() {
        for ihl in 0..5 {
            let bytes = build_ipv4_frame(Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST, ihl);
            let err = decode_frame(&captured(&bytes, 60)).unwrap_err();
            assert_eq!(
                err,
                DecodeError::InvalidHeaderLength {
                    header_len: usize::from(ihl) * 4
                }
            );
        }
    }

    #[test]
    fn rejects_truncated_frame() {
        let bytes = build_ipv4_frame(Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST, 5);
        let err = decode_frame(&captured(&bytes[..30], 60)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                len: 30,
                required: 34
            }
        );
    }

    #[test]
    fn rejects_empty_frame() {
        let err = decode_frame(&captured(&[], 0)).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { len: 0, .. }));
    }

    #[test]
    fn ignores_version_nibble() {
        // 상위 4비트(version)는 검사하지 않음. 업스트림 필터가 IP만 통과시킴
        let mut bytes = build_ipv4_frame(Ipv4Addr::LOCALHOST, Ipv4Addr::new(1, 2, 3, 4), 5);
        bytes[ETHERNET_HEADER_LEN] = 0x05;
        let packet = decode_frame(&captured(&bytes, 64)).unwrap();
        assert_eq!(packet.destination, Ipv4Addr::new(1, 2, 3, 4));
    }
}
