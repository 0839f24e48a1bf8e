//! 설정 관리: inbursts.toml 파싱 및 런타임 설정
//!
//! [`InburstsConfig`]는 로깅, 캡처, 출력 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, 바이너리에서 적용)
//! 2. 환경변수 (`INBURSTS_CAPTURE_INTERFACE=eth0` 형식)
//! 3. 설정 파일 (`inbursts.toml`, 선택)
//! 4. 기본값 (`Default` 구현)
//!
//! # 설정 예시 (TOML)
//! ```toml
//! [general]
//! log_level = "info"
//! log_format = "compact"
//!
//! [capture]
//! interface = "eth0"
//! count = 0
//! snaplen = 100
//!
//! [output]
//! path = "inbursts.out"
//! ```

use std::net::Ipv4Addr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, InburstsError};

/// inbursts 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InburstsConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 캡처 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 출력 설정
    #[serde(default)]
    pub output: OutputConfig,
}

impl InburstsConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, InburstsError> {
        let mut config = Self::read_file(path.as_ref()).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일(없으면 기본값)에 환경변수 오버라이드를 적용합니다.
    ///
    /// 검증하지 않습니다. 호출자가 CLI 오버라이드까지 적용한 뒤
    /// [`validate`](Self::validate)를 한 번 호출해야 합니다.
    pub async fn resolve(path: Option<&Path>) -> Result<Self, InburstsError> {
        let mut config = match path {
            Some(path) => Self::read_file(path).await?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, InburstsError> {
        let config = Self::read_file(path.as_ref()).await?;
        config.validate()?;
        Ok(config)
    }

    async fn read_file(path: &Path) -> Result<Self, InburstsError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                InburstsError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                InburstsError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, InburstsError> {
        toml::from_str(toml_str).map_err(|e| {
            InburstsError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `INBURSTS_{SECTION}_{FIELD}`
    /// 예: `INBURSTS_CAPTURE_INTERFACE=eth0`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "INBURSTS_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "INBURSTS_GENERAL_LOG_FORMAT");

        // Capture
        override_string(&mut self.capture.interface, "INBURSTS_CAPTURE_INTERFACE");
        override_u64(&mut self.capture.count, "INBURSTS_CAPTURE_COUNT");
        override_i32(&mut self.capture.snaplen, "INBURSTS_CAPTURE_SNAPLEN");
        override_bool(
            &mut self.capture.promiscuous,
            "INBURSTS_CAPTURE_PROMISCUOUS",
        );
        override_i32(
            &mut self.capture.read_timeout_ms,
            "INBURSTS_CAPTURE_READ_TIMEOUT_MS",
        );
        override_string(&mut self.capture.filter, "INBURSTS_CAPTURE_FILTER");
        override_string(&mut self.capture.local_addr, "INBURSTS_CAPTURE_LOCAL_ADDR");
        override_string(&mut self.capture.savefile, "INBURSTS_CAPTURE_SAVEFILE");

        // Output
        override_string(&mut self.output.path, "INBURSTS_OUTPUT_PATH");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), InburstsError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty", "compact"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.capture.snaplen <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "capture.snaplen".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.capture.read_timeout_ms <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "capture.read_timeout_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.capture.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "capture.filter".to_owned(),
                reason: "filter must not be empty".to_owned(),
            }
            .into());
        }

        // local_addr는 비어 있거나 IPv4 주소여야 함
        self.capture.local_addr()?;

        if self.output.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output.path".to_owned(),
                reason: "output path must not be empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty, compact)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "compact".to_owned(),
        }
    }
}

/// 캡처 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// 감시할 네트워크 인터페이스 (비어 있으면 첫 번째 non-loopback 인터페이스)
    pub interface: String,
    /// 수집할 프레임 수 (0이면 무제한)
    pub count: u64,
    /// 프레임당 캡처 바이트 수
    pub snaplen: i32,
    /// promiscuous 모드 여부
    pub promiscuous: bool,
    /// 읽기 타임아웃 (밀리초). 종료 요청을 확인하는 최대 간격입니다.
    pub read_timeout_ms: i32,
    /// BPF 필터 표현식
    pub filter: String,
    /// 인바운드 판정에 사용할 로컬 IPv4 주소 (비어 있으면 인터페이스에서 조회)
    pub local_addr: String,
    /// 라이브 캡처 대신 재생할 pcap 파일 (비어 있으면 라이브 캡처)
    pub savefile: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface: String::new(),
            count: 0,
            snaplen: 100,
            promiscuous: true,
            read_timeout_ms: 100,
            filter: "ip".to_owned(),
            local_addr: String::new(),
            savefile: String::new(),
        }
    }
}

impl CaptureConfig {
    /// 명시적으로 지정된 인터페이스 이름
    pub fn interface(&self) -> Option<&str> {
        non_empty(&self.interface)
    }

    /// 프레임 수 제한 (0이면 `None`)
    pub fn frame_limit(&self) -> Option<u64> {
        (self.count > 0).then_some(self.count)
    }

    /// 재생할 savefile 경로
    pub fn savefile(&self) -> Option<&Path> {
        non_empty(&self.savefile).map(Path::new)
    }

    /// 명시적으로 지정된 로컬 주소를 파싱합니다.
    pub fn local_addr(&self) -> Result<Option<Ipv4Addr>, InburstsError> {
        match non_empty(&self.local_addr) {
            None => Ok(None),
            Some(raw) => raw.parse::<Ipv4Addr>().map(Some).map_err(|e| {
                ConfigError::InvalidValue {
                    field: "capture.local_addr".to_owned(),
                    reason: format!("'{raw}' is not an IPv4 address: {e}"),
                }
                .into()
            }),
        }
    }
}

/// 출력 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// 버스트 레코드 출력 파일 경로
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "inbursts.out".to_owned(),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_i32(target: &mut i32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<i32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse i32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
