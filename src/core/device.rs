// デバイスプール - Producerワーカーと1対1で対応する計算デバイス

use super::error::{RunnerError, RunnerResult};
use std::fmt;
use std::str::FromStr;

const CPU: &str = "cpu";

/// 計算デバイス識別子（"cpu", "cuda:0" など）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Device(String);

impl Device {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn cpu() -> Self {
        Self(CPU.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// "kind:ordinal" 形式のkind部分
    pub fn kind(&self) -> &str {
        self.0.split(':').next().unwrap_or(&self.0)
    }

    /// "cuda:1" のような形式の番号部分
    pub fn ordinal(&self) -> Option<u32> {
        self.0.split_once(':').and_then(|(_, n)| n.parse().ok())
    }

    pub fn is_cpu(&self) -> bool {
        self.kind() == CPU
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Device {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(RunnerError::configuration("デバイス名が空です"));
        }
        Ok(Self::new(name))
    }
}

/// ランナーに割り当てられたデバイス一覧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePool {
    devices: Vec<Device>,
}

impl DevicePool {
    /// `count`個のCPUデバイス
    pub fn cpus(count: usize) -> RunnerResult<Self> {
        Self::from_devices(std::iter::repeat_with(Device::cpu).take(count))
    }

    /// 論理CPU数ぶんのCPUデバイス
    pub fn available_cpus() -> Self {
        Self {
            devices: std::iter::repeat_with(Device::cpu)
                .take(num_cpus::get().max(1))
                .collect(),
        }
    }

    pub fn from_devices(devices: impl IntoIterator<Item = Device>) -> RunnerResult<Self> {
        let devices: Vec<Device> = devices.into_iter().collect();
        if devices.is_empty() {
            return Err(RunnerError::configuration(
                "デバイスは1つ以上指定する必要があります",
            ));
        }
        Ok(Self { devices })
    }

    /// "cpu", "cuda:0" のような名前のリストから作成
    pub fn from_names<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> RunnerResult<Self> {
        let devices = names
            .into_iter()
            .map(|name| name.as_ref().parse())
            .collect::<RunnerResult<Vec<Device>>>()?;
        Self::from_devices(devices)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Device> {
        self.devices.iter()
    }
}

impl TryFrom<usize> for DevicePool {
    type Error = RunnerError;

    fn try_from(count: usize) -> Result<Self, Self::Error> {
        Self::cpus(count)
    }
}

impl<'a> IntoIterator for &'a DevicePool {
    type Item = &'a Device;
    type IntoIter = std::slice::Iter<'a, Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
