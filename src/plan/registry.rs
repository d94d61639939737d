//! Built-in plan: the deployment stack this runner was written for.
//!
//! Phases mirror the stack's bring-up order: host networking, the proxy
//! config, the Docker engine, the GPU stack, the declared container set,
//! then service endpoints. A YAML plan file supplied with `--plan`
//! replaces this registry entirely.

use crate::endpoint::{EndpointSpec, EndpointTarget};
use crate::plan::{Action, ActionKind, EndpointPhase, Phase, PlanDocument, Probe, ProbeKind};

const DATA_DIR: &str = "/opt/stack/data";
const NGINX_CONF: &str = "/etc/nginx/conf.d/stack.conf";
const NGINX_CONTENTS: &str = "\
server {
    listen 80;
    location / { proxy_pass http://127.0.0.1:8000; }
    location /grafana/ { proxy_pass http://127.0.0.1:3000/; }
}
";

/// Containers declared by the stack's compose file.
const CONTAINERS: [&str; 6] = ["postgres", "redis", "prometheus", "grafana", "jupyter", "app"];

/// Returns the built-in plan document.
#[must_use]
pub fn builtin() -> PlanDocument {
    let mut probes = Vec::new();
    let mut actions = Vec::new();
    let mut phases = Vec::new();

    // networking: every failure here poisons the rest of the bring-up.
    phases.push(Phase {
        name: "networking".into(),
        critical: true,
        depends_on: vec![],
        probes: vec![
            "mirror_resolves".into(),
            "port_80_free".into(),
            "port_443_free".into(),
            "curl_present".into(),
        ],
    });
    probes.push(probe(
        "mirror_resolves",
        "networking",
        "Docker package mirror resolves",
        ProbeKind::DnsResolves { host: "download.docker.com".into() },
    ));
    probes.push(probe(
        "port_80_free",
        "networking",
        "port 80 is free for the reverse proxy",
        ProbeKind::PortFree { port: 80 },
    ));
    probes.push(probe(
        "port_443_free",
        "networking",
        "port 443 is free for the reverse proxy",
        ProbeKind::PortFree { port: 443 },
    ));
    probes.push(probe(
        "curl_present",
        "networking",
        "curl is available",
        ProbeKind::BinaryPresent { binary: "curl".into() },
    ));
    actions.push(action(
        "install_curl",
        "curl_present",
        true,
        false,
        ActionKind::InstallPackage { package: "curl".into() },
    ));

    // proxy: generated config for the reverse proxy.
    phases.push(Phase {
        name: "proxy".into(),
        critical: false,
        depends_on: vec!["networking".into()],
        probes: vec!["nginx_conf_present".into()],
    });
    probes.push(probe(
        "nginx_conf_present",
        "proxy",
        "reverse proxy config is present",
        ProbeKind::PathExists { path: NGINX_CONF.into() },
    ));
    actions.push(action(
        "write_nginx_conf",
        "nginx_conf_present",
        true,
        false,
        ActionKind::WriteConfigFile { path: NGINX_CONF.into(), contents: NGINX_CONTENTS.into() },
    ));

    // docker: engine, compose plugin, data directory.
    phases.push(Phase {
        name: "docker".into(),
        critical: true,
        depends_on: vec!["networking".into()],
        probes: vec![
            "docker_installed".into(),
            "docker_active".into(),
            "compose_plugin_installed".into(),
            "data_dir_present".into(),
        ],
    });
    probes.push(probe(
        "docker_installed",
        "docker",
        "Docker engine package is installed",
        ProbeKind::PackageInstalled { package: "docker-ce".into() },
    ));
    actions.push(action(
        "install_docker",
        "docker_installed",
        true,
        false,
        ActionKind::InstallPackage { package: "docker-ce".into() },
    ));
    probes.push(probe(
        "docker_active",
        "docker",
        "Docker service is active",
        ProbeKind::ServiceActive { service: "docker".into() },
    ));
    actions.push(action(
        "start_docker",
        "docker_active",
        true,
        false,
        ActionKind::StartService { service: "docker".into() },
    ));
    probes.push(probe(
        "compose_plugin_installed",
        "docker",
        "Docker Compose plugin is installed",
        ProbeKind::PackageInstalled { package: "docker-compose-plugin".into() },
    ));
    actions.push(action(
        "install_compose_plugin",
        "compose_plugin_installed",
        true,
        false,
        ActionKind::InstallPackage { package: "docker-compose-plugin".into() },
    ));
    probes.push(probe(
        "data_dir_present",
        "docker",
        "persistent data directory exists",
        ProbeKind::PathExists { path: DATA_DIR.into() },
    ));
    actions.push(action(
        "create_data_dir",
        "data_dir_present",
        true,
        false,
        ActionKind::CreateDirectory { path: DATA_DIR.into() },
    ));

    // gpu: an absent GPU is fatal and unfixable; the toolkit install
    // needs a restart before the runtime picks it up.
    phases.push(Phase {
        name: "gpu".into(),
        critical: true,
        depends_on: vec![],
        probes: vec![
            "gpu_present".into(),
            "nvidia_smi_present".into(),
            "container_toolkit_installed".into(),
        ],
    });
    probes.push(probe(
        "gpu_present",
        "gpu",
        "a GPU is visible to the driver",
        ProbeKind::GpuPresent,
    ));
    probes.push(probe(
        "nvidia_smi_present",
        "gpu",
        "nvidia-smi is available",
        ProbeKind::BinaryPresent { binary: "nvidia-smi".into() },
    ));
    probes.push(probe(
        "container_toolkit_installed",
        "gpu",
        "NVIDIA container toolkit is installed",
        ProbeKind::PackageInstalled { package: "nvidia-container-toolkit".into() },
    ));
    actions.push(action(
        "install_container_toolkit",
        "container_toolkit_installed",
        true,
        true,
        ActionKind::InstallPackage { package: "nvidia-container-toolkit".into() },
    ));

    // containers: one probe per declared container, each remediated by
    // converging the whole declared set.
    phases.push(Phase {
        name: "containers".into(),
        critical: false,
        depends_on: vec!["docker".into(), "gpu".into()],
        probes: CONTAINERS.iter().map(|name| format!("{name}_running")).collect(),
    });
    for name in CONTAINERS {
        probes.push(probe(
            &format!("{name}_running"),
            "containers",
            &format!("{name} container is running"),
            ProbeKind::ContainerRunning { container: name.into() },
        ));
        actions.push(action(
            &format!("apply_stack_{name}"),
            &format!("{name}_running"),
            false,
            false,
            ActionKind::ApplyDeclaredContainers,
        ));
    }

    let endpoints = EndpointPhase {
        name: "endpoints".into(),
        depends_on: vec!["containers".into()],
        endpoints: vec![
            endpoint("app", EndpointTarget::Http { url: "http://localhost:8000/api/health".into() }, true),
            endpoint(
                "grafana",
                EndpointTarget::Http { url: "http://localhost:3000/api/health".into() },
                false,
            ),
            endpoint(
                "prometheus",
                EndpointTarget::Http { url: "http://localhost:9090/-/healthy".into() },
                false,
            ),
            endpoint(
                "jupyter",
                EndpointTarget::Http { url: "http://localhost:8888/api".into() },
                false,
            ),
            endpoint("postgres", EndpointTarget::Tcp { addr: "localhost:5432".into() }, false),
            endpoint("redis", EndpointTarget::Tcp { addr: "localhost:6379".into() }, false),
        ],
    };

    PlanDocument { phases, probes, actions, endpoints: Some(endpoints) }
}

fn probe(id: &str, phase: &str, description: &str, kind: ProbeKind) -> Probe {
    Probe { id: id.into(), phase: phase.into(), description: description.into(), kind }
}

fn action(id: &str, applies_to: &str, needs_root: bool, requires_restart: bool, kind: ActionKind) -> Action {
    Action { id: id.into(), applies_to: applies_to.into(), needs_root, requires_restart, kind }
}

fn endpoint(name: &str, target: EndpointTarget, required: bool) -> EndpointSpec {
    EndpointSpec { name: name.into(), target, required }
}
