//! 캡처 소스: 프레임 공급자 추상화와 libpcap 구현
//!
//! [`FrameSource`]는 실행 컨트롤러가 프레임을 하나씩 당겨오는 확장 포인트입니다.
//!
//! # 구현
//! - [`PcapSource`]: libpcap 라이브 캡처 또는 savefile 재생 (`pcap` 크레이트)
//! - [`MemorySource`]: 메모리 내 프레임 목록 (테스트, 벤치마크)
//!
//! 라이브 캡처는 읽기 타임아웃마다 [`NextFrame::Idle`]을 반환하여
//! 컨트롤러가 프레임 사이에서 종료 요청을 확인할 수 있게 합니다.

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

use pcap::{Activated, Active, Capture, Device, Linktype, Offline};
use serde::Serialize;
use tracing::{debug, info};

use inbursts_core::config::CaptureConfig;
use inbursts_core::error::{CaptureError, InburstsError};
use inbursts_core::types::{CaptureTimestamp, CapturedFrame, OwnedFrame};

/// 프레임 공급 결과
#[derive(Debug)]
pub enum NextFrame<'a> {
    /// 캡처된 프레임
    Frame(CapturedFrame<'a>),
    /// 읽기 타임아웃: 프레임 없음
    Idle,
    /// 더 이상 프레임이 없음 (savefile 끝 등)
    Exhausted,
}

/// 캡처 장치 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureStats {
    /// 캡처 장치가 받은 패킷 수
    pub received: u32,
    /// 버퍼 부족으로 커널이 버린 패킷 수
    pub dropped: u32,
    /// 인터페이스가 버린 패킷 수
    pub if_dropped: u32,
}

/// 프레임 공급자
pub trait FrameSource {
    /// 다음 프레임을 가져옵니다.
    fn next_frame(&mut self) -> Result<NextFrame<'_>, InburstsError>;

    /// 로그에 표시할 소스 이름 (인터페이스명 또는 파일 경로)
    fn describe(&self) -> &str;

    /// 캡처 장치 통계 (지원하지 않으면 `None`)
    fn capture_stats(&mut self) -> Option<CaptureStats> {
        None
    }
}

// =============================================================================
// 장치/주소 조회
// =============================================================================

/// 캡처할 장치를 결정합니다.
///
/// 이름이 주어지면 장치 목록에서 찾고, 없으면 첫 번째 non-loopback 장치를 사용합니다.
pub fn resolve_device(interface: Option<&str>) -> Result<Device, InburstsError> {
    match interface {
        Some(name) => Device::list()
            .map_err(|e| CaptureError::NoDevices(e.to_string()))?
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| CaptureError::DeviceNotFound(name.to_owned()).into()),
        None => Device::lookup()
            .map_err(|e| CaptureError::NoDevices(e.to_string()))?
            .ok_or_else(|| {
                CaptureError::NoDevices("no non-loopback device available".to_owned()).into()
            }),
    }
}

/// 장치에 할당된 첫 번째 IPv4 주소를 반환합니다.
pub fn local_ipv4(device: &Device) -> Result<Ipv4Addr, InburstsError> {
    device
        .addresses
        .iter()
        .find_map(|a| match a.addr {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| CaptureError::NoAddress(device.name.clone()).into())
}

// =============================================================================
// libpcap 소스
// =============================================================================

enum PcapHandle {
    Live(Capture<Active>),
    Savefile(Capture<Offline>),
}

/// libpcap 기반 프레임 소스
pub struct PcapSource {
    handle: PcapHandle,
    target: String,
}

impl PcapSource {
    /// 장치를 열어 라이브 캡처를 시작합니다.
    ///
    /// 이더넷 링크 타입만 허용하며, 설정된 BPF 필터를 설치합니다.
    pub fn open_live(device: Device, config: &CaptureConfig) -> Result<Self, InburstsError> {
        let target = device.name.clone();
        let open_err = |e: pcap::Error| CaptureError::Open {
            target: target.clone(),
            reason: e.to_string(),
        };

        let mut capture = Capture::from_device(device)
            .map_err(open_err)?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.read_timeout_ms)
            .open()
            .map_err(open_err)?;

        ensure_ethernet(&capture, &target)?;
        install_filter(&mut capture, &config.filter)?;

        info!(
            interface = target.as_str(),
            snaplen = config.snaplen,
            promiscuous = config.promiscuous,
            filter = config.filter.as_str(),
            "live capture opened"
        );

        Ok(Self {
            handle: PcapHandle::Live(capture),
            target,
        })
    }

    /// pcap savefile을 열어 재생합니다.
    pub fn open_savefile(path: &Path, config: &CaptureConfig) -> Result<Self, InburstsError> {
        let target = path.display().to_string();
        let mut capture = Capture::from_file(path).map_err(|e| CaptureError::Open {
            target: target.clone(),
            reason: e.to_string(),
        })?;

        ensure_ethernet(&capture, &target)?;
        install_filter(&mut capture, &config.filter)?;

        info!(
            savefile = target.as_str(),
            filter = config.filter.as_str(),
            "savefile opened"
        );

        Ok(Self {
            handle: PcapHandle::Savefile(capture),
            target,
        })
    }
}

impl FrameSource for PcapSource {
    fn next_frame(&mut self) -> Result<NextFrame<'_>, InburstsError> {
        match &mut self.handle {
            PcapHandle::Live(capture) => read_frame(capture),
            PcapHandle::Savefile(capture) => read_frame(capture),
        }
    }

    fn describe(&self) -> &str {
        &self.target
    }

    fn capture_stats(&mut self) -> Option<CaptureStats> {
        match &mut self.handle {
            PcapHandle::Live(capture) => match capture.stats() {
                Ok(stat) => Some(CaptureStats {
                    received: stat.received,
                    dropped: stat.dropped,
                    if_dropped: stat.if_dropped,
                }),
                Err(e) => {
                    debug!(error = %e, "capture stats unavailable");
                    None
                }
            },
            PcapHandle::Savefile(_) => None,
        }
    }
}

fn ensure_ethernet<T: Activated + ?Sized>(
    capture: &Capture<T>,
    target: &str,
) -> Result<(), CaptureError> {
    let link = capture.get_datalink();
    if link == Linktype::ETHERNET {
        return Ok(());
    }
    Err(CaptureError::UnsupportedLinkType {
        target: target.to_owned(),
        link_type: link.get_name().unwrap_or_else(|_| link.0.to_string()),
    })
}

fn install_filter<T: Activated + ?Sized>(
    capture: &mut Capture<T>,
    filter: &str,
) -> Result<(), CaptureError> {
    capture
        .filter(filter, false)
        .map_err(|e| CaptureError::Filter {
            filter: filter.to_owned(),
            reason: e.to_string(),
        })
}

fn read_frame<T: Activated + ?Sized>(
    capture: &mut Capture<T>,
) -> Result<NextFrame<'_>, InburstsError> {
    match capture.next_packet() {
        Ok(packet) => {
            let header = packet.header;
            Ok(NextFrame::Frame(CapturedFrame {
                timestamp: CaptureTimestamp::from_timeval(
                    i64::from(header.ts.tv_sec),
                    i64::from(header.ts.tv_usec),
                ),
                wire_len: header.len,
                data: packet.data,
            }))
        }
        Err(pcap::Error::TimeoutExpired) => Ok(NextFrame::Idle),
        Err(pcap::Error::NoMorePackets) => Ok(NextFrame::Exhausted),
        Err(e) => Err(CaptureError::Read(e.to_string()).into()),
    }
}

// =============================================================================
// 메모리 소스
// =============================================================================

/// 메모리 내 프레임 목록을 순서대로 공급하는 소스
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<OwnedFrame>,
    current: Option<OwnedFrame>,
}

impl MemorySource {
    /// 빈 소스를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 프레임을 끝에 추가합니다.
    pub fn push(&mut self, frame: OwnedFrame) {
        self.frames.push_back(frame);
    }

    /// 아직 공급되지 않은 프레임 수
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FromIterator<OwnedFrame> for MemorySource {
    fn from_iter<I: IntoIterator<Item = OwnedFrame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
            current: None,
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<NextFrame<'_>, InburstsError> {
        match self.frames.pop_front() {
            Some(frame) => {
                let frame = self.current.insert(frame);
                Ok(NextFrame::Frame(frame.as_captured()))
            }
            None => Ok(NextFrame::Exhausted),
        }
    }

    fn describe(&self) -> &str {
        "memory"
    }
}
