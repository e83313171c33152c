//! 服务注册表
//!
//! 启动时根据配置一次性构建，之后只读共享

use super::engine::ServiceEngine;
use super::registration::ProbeRegistration;
use crate::config::Config;
use crate::error::RegistryError;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 服务标识到服务引擎的映射
#[derive(Debug, Clone)]
pub struct Registry {
    services: BTreeMap<String, Arc<ServiceEngine>>,
}

impl Registry {
    /// 由已构建的服务引擎创建注册表
    ///
    /// # 参数
    /// * `services` - 服务标识到服务引擎的映射，不能为空
    pub fn new(services: BTreeMap<String, ServiceEngine>) -> Result<Self, RegistryError> {
        if services.is_empty() {
            return Err(RegistryError::NoServices);
        }

        Ok(Self {
            services: services
                .into_iter()
                .map(|(key, engine)| (key, Arc::new(engine)))
                .collect(),
        })
    }

    /// 根据配置构建注册表
    ///
    /// 任一探针类型无法识别、构建失败或名称重复时立即返回错误
    ///
    /// # 参数
    /// * `config` - 已加载的配置
    ///
    /// # 返回
    /// * `Result<Self, RegistryError>` - 注册表或第一个遇到的错误
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let mut services = BTreeMap::new();

        for (key, spec) in &config.services {
            let mut registrations = Vec::with_capacity(spec.checks.len());

            for check in &spec.checks {
                let kind = check
                    .kind()
                    .map_err(|reason| RegistryError::UnknownProbeKind {
                        service: key.clone(),
                        probe: check.name.clone(),
                        reason,
                    })?;

                let probe = kind.build().map_err(|source| RegistryError::ProbeBuild {
                    service: key.clone(),
                    probe: check.name.clone(),
                    source,
                })?;

                registrations.push(
                    ProbeRegistration::new(&check.name, probe)
                        .with_timeout_secs(check.timeout)
                        .skip_on_error(check.optional),
                );
            }

            tracing::info!(
                "为服务 \"{}\" ({} {}) 注册了 {} 个健康检查",
                key,
                spec.name,
                spec.version,
                registrations.len()
            );

            let engine = ServiceEngine::new(&spec.name, &spec.version, registrations)?;
            services.insert(key.clone(), engine);
        }

        Self::new(services)
    }

    /// 按服务标识查找服务引擎
    pub fn get(&self, key: &str) -> Option<&Arc<ServiceEngine>> {
        self.services.get(key)
    }

    /// 所有服务标识，按字典序
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// 遍历所有服务
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<ServiceEngine>)> {
        self.services.iter().map(|(key, engine)| (key.as_str(), engine))
    }

    /// 服务数量
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// 是否为空（构建成功的注册表永远不为空）
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
