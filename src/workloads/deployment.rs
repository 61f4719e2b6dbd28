//! Busybox Deployment writing to a replicated PVC.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec, Volume, VolumeMount,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use crate::config::PvcSpec;

use super::{Workload, WorkloadResources};

/// Workload kind selecting this implementation.
pub const KIND: &str = "deploy";

const APP_NAME: &str = "busybox";
const IMAGE: &str = "quay.io/nirsof/busybox:stable";
const MOUNT_PATH: &str = "/mnt/test";

/// Single-replica busybox Deployment appending timestamps to a PVC.
#[derive(Clone, Debug)]
pub struct DeploymentWorkload {
    pvc_spec: PvcSpec,
}

impl DeploymentWorkload {
    pub fn new(pvc_spec: PvcSpec) -> Self {
        Self { pvc_spec }
    }

    fn pvc_name(&self) -> String {
        format!("{}-pvc", APP_NAME)
    }

    fn generate_pvc(&self, namespace: &str) -> PersistentVolumeClaim {
        let mut requests = BTreeMap::new();
        requests.insert("storage".to_string(), Quantity(self.pvc_spec.size.clone()));

        PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(self.pvc_name()),
                namespace: Some(namespace.to_string()),
                labels: Some(self.selector_labels()),
                ..Default::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(self.pvc_spec.access_modes.clone()),
                storage_class_name: Some(self.pvc_spec.storage_class_name.clone()),
                resources: Some(VolumeResourceRequirements {
                    requests: Some(requests),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn generate_deployment(&self, namespace: &str) -> Deployment {
        let labels = self.selector_labels();

        Deployment {
            metadata: ObjectMeta {
                name: Some(APP_NAME.to_string()),
                namespace: Some(namespace.to_string()),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(1),
                selector: LabelSelector {
                    match_labels: Some(labels.clone()),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![Container {
                            name: "logger".to_string(),
                            image: Some(IMAGE.to_string()),
                            command: Some(vec![
                                "sh".to_string(),
                                "-c".to_string(),
                                format!(
                                    "trap exit TERM; while true; do date >> {}/outfile; sync; sleep 10 & wait; done",
                                    MOUNT_PATH
                                ),
                            ]),
                            volume_mounts: Some(vec![VolumeMount {
                                name: "data".to_string(),
                                mount_path: MOUNT_PATH.to_string(),
                                ..Default::default()
                            }]),
                            ..Default::default()
                        }],
                        volumes: Some(vec![Volume {
                            name: "data".to_string(),
                            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                                claim_name: self.pvc_name(),
                                read_only: None,
                            }),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

impl Workload for DeploymentWorkload {
    fn kind(&self) -> &str {
        KIND
    }

    fn pvc_spec(&self) -> &PvcSpec {
        &self.pvc_spec
    }

    fn selector_labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert("appname".to_string(), APP_NAME.to_string());
        labels
    }

    fn resources(&self, namespace: &str) -> WorkloadResources {
        WorkloadResources {
            pvcs: vec![self.generate_pvc(namespace)],
            deployments: vec![self.generate_deployment(namespace)],
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::get_unwrap
)]
mod tests {
    use super::*;

    fn workload() -> DeploymentWorkload {
        DeploymentWorkload::new(PvcSpec {
            name: "rbd".to_string(),
            storage_class_name: "rook-ceph-block".to_string(),
            access_modes: vec!["ReadWriteOnce".to_string()],
            size: "2Gi".to_string(),
        })
    }

    #[test]
    fn test_pvc_follows_spec() {
        let resources = workload().resources("e2e-app");
        let pvc = &resources.pvcs[0];
        assert_eq!(pvc.metadata.namespace.as_deref(), Some("e2e-app"));

        let spec = pvc.spec.as_ref().unwrap();
        assert_eq!(spec.storage_class_name.as_deref(), Some("rook-ceph-block"));
        assert_eq!(
            spec.access_modes.as_ref().unwrap(),
            &vec!["ReadWriteOnce".to_string()]
        );
        let requests = spec.resources.as_ref().unwrap().requests.as_ref().unwrap();
        assert_eq!(requests.get("storage").unwrap().0, "2Gi");
    }

    #[test]
    fn test_deployment_mounts_pvc() {
        let resources = workload().resources("e2e-app");
        let deployment = &resources.deployments[0];
        let pod = deployment
            .spec
            .as_ref()
            .unwrap()
            .template
            .spec
            .as_ref()
            .unwrap();
        let claim = pod.volumes.as_ref().unwrap()[0]
            .persistent_volume_claim
            .as_ref()
            .unwrap();
        assert_eq!(claim.claim_name, "busybox-pvc");
    }

    #[test]
    fn test_pvc_selected_by_app_labels() {
        let w = workload();
        let resources = w.resources("ns");
        assert_eq!(
            resources.pvcs[0].metadata.labels.as_ref().unwrap(),
            &w.selector_labels()
        );
    }
}
