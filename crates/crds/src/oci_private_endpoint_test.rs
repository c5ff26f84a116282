//! Unit tests for OCIPrivateEndpoint status handling and validation

#[cfg(test)]
mod tests {
    use crate::conditions::ConditionStatus;
    use crate::oci_private_endpoint::*;
    use crate::references::OCIResourceReference;
    use crate::validation::ValidationError;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use kube::CustomResourceExt;

    use crate::oci_private_endpoint::OCIPrivateEndpointConditionType as T;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn spec() -> OCIPrivateEndpointSpec {
        OCIPrivateEndpointSpec {
            network_load_balancer_id: "ocid1.loadbalancer.oc1.us-sanjose-1.aaaaaaaanlb".to_string(),
            reserved_ip: Some("10.0.0.10".to_string()),
            service_gateway: Some(OCIResourceReference::new(
                "ocid1.servicegateway.oc1.us-sanjose-1.aaaaaaaasgw",
            )),
            customer_vcn: OCIResourceReference::new("ocid1.vcn.oc1.us-sanjose-1.aaaaaaaavcn"),
            allowed_cidrs: vec!["10.0.0.0/16".to_string()],
        }
    }

    #[test]
    fn test_all_sub_conditions_true_makes_available() {
        let mut status = OCIPrivateEndpointStatus::default();
        for (i, t) in T::SUB_CONDITIONS.into_iter().enumerate() {
            let now = t0() + Duration::seconds(i as i64);
            status.set_sub_condition(t, Ok("done".to_string()), Some(3), now);
        }

        assert!(status.is_available());
        let available = status.conditions.get(T::Available).unwrap();
        assert_eq!(available.reason, REASON_OCI_SUCCESS);
        assert_eq!(available.observed_generation, Some(3));
        assert_eq!(status.conditions.len(), 5);
    }

    #[test]
    fn test_failed_sub_condition_flips_aggregate() {
        let mut status = OCIPrivateEndpointStatus::default();
        for t in T::SUB_CONDITIONS {
            status.set_sub_condition(t, Ok(String::new()), Some(1), t0());
        }
        assert!(status.is_available());

        let later = t0() + Duration::minutes(5);
        status.set_sub_condition(
            T::DnsConfigured,
            Err("zone not found".to_string()),
            Some(2),
            later,
        );

        let available = status.conditions.get(T::Available).unwrap();
        assert_eq!(available.status, ConditionStatus::False);
        assert_eq!(available.reason, REASON_OCI_ERROR);
        assert_eq!(available.message, "zone not found");
        assert_eq!(available.last_transition_time, later);

        let dns = status.conditions.get(T::DnsConfigured).unwrap();
        assert_eq!(dns.reason, REASON_OCI_ERROR);
        assert_eq!(dns.last_transition_time, later);
    }

    #[test]
    fn test_most_recent_failure_message_wins() {
        let mut status = OCIPrivateEndpointStatus::default();
        status.set_sub_condition(T::ServiceGatewayAttached, Err("old".to_string()), None, t0());
        status.set_sub_condition(
            T::NetworkLoadBalancerReady,
            Err("new".to_string()),
            None,
            t0() + Duration::seconds(30),
        );

        assert_eq!(status.conditions.get(T::Available).unwrap().message, "new");
    }

    #[test]
    fn test_missing_sub_condition_is_not_available() {
        let mut status = OCIPrivateEndpointStatus::default();
        status.set_sub_condition(T::NetworkLoadBalancerReady, Ok(String::new()), None, t0());

        let available = status.conditions.get(T::Available).unwrap();
        assert_eq!(available.status, ConditionStatus::False);
        assert!(available.message.contains("OCIServiceGatewayAttached"));
        assert!(!status.is_available());
    }

    #[test]
    fn test_aggregate_cannot_be_set_directly() {
        let mut status = OCIPrivateEndpointStatus::default();
        assert!(!status.set_sub_condition(T::Available, Ok(String::new()), None, t0()));
        assert!(status.conditions.is_empty());
    }

    #[test]
    fn test_repeated_success_keeps_transition_time() {
        let mut status = OCIPrivateEndpointStatus::default();
        for t in T::SUB_CONDITIONS {
            status.set_sub_condition(t, Ok(String::new()), Some(1), t0());
        }
        let changed = status.set_sub_condition(
            T::RouteRulesConfigured,
            Ok(String::new()),
            Some(1),
            t0() + Duration::hours(1),
        );

        assert!(!changed);
        assert_eq!(
            status.conditions.get(T::Available).unwrap().last_transition_time,
            t0()
        );
    }

    #[test]
    fn test_wire_names() {
        let mut status = OCIPrivateEndpointStatus {
            network_load_balancer_ip: Some("10.0.0.5".to_string()),
            service_gateway_id: Some("ocid1.servicegateway.oc1.phx.aaaa".to_string()),
            ..Default::default()
        };
        status.set_sub_condition(T::DnsConfigured, Ok(String::new()), None, t0());

        let spec_json = serde_json::to_value(spec()).unwrap();
        assert!(spec_json.get("networkLoadBalancerID").is_some());
        assert!(spec_json.get("reservedIP").is_some());
        assert!(spec_json.get("customerVCN").is_some());
        assert!(spec_json.get("allowedCIDRs").is_some());
        assert_eq!(
            spec_json["serviceGateway"]["ocid"],
            "ocid1.servicegateway.oc1.us-sanjose-1.aaaaaaaasgw"
        );

        // Survives a read-modify-write
        let read: OCIPrivateEndpointSpec = serde_json::from_value(spec_json).unwrap();
        assert_eq!(read.service_gateway, spec().service_gateway);

        let status_json = serde_json::to_value(&status).unwrap();
        assert_eq!(status_json["networkLoadBalancerIP"], "10.0.0.5");
        assert!(status_json.get("serviceGatewayID").is_some());
        assert!(status_json["conditions"].is_array());
    }

    #[test]
    fn test_spec_validation() {
        assert_eq!(spec().validate(), Ok(()));

        let mut bad = spec();
        bad.network_load_balancer_id = "ocid1.vcn.oc1.phx.aaaa".to_string();
        bad.reserved_ip = Some("10.0.0.300".to_string());
        bad.allowed_cidrs = vec!["10.0.0.0/40".to_string()];
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.len(), 3);

        let mut bad_gateway = spec();
        bad_gateway.service_gateway = Some(OCIResourceReference::new("sgw"));
        let errors = bad_gateway.validate().unwrap_err();
        assert!(matches!(&errors[0], ValidationError::Pattern { field, .. } if field == "serviceGateway.ocid"));

        let mut no_gateway = spec();
        no_gateway.service_gateway = None;
        assert_eq!(no_gateway.validate(), Ok(()));

        let mut too_many = spec();
        too_many.allowed_cidrs = vec!["10.0.0.0/8".to_string(); 51];
        let errors = too_many.validate().unwrap_err();
        assert!(matches!(errors[0], ValidationError::TooMany { count: 51, .. }));
    }

    #[test]
    fn test_status_accepts_dns_zone_ocid() {
        let status = OCIPrivateEndpointStatus {
            service_gateway_id: Some("ocid1.servicegateway.oc1.phx.aaaaaaaasgw".to_string()),
            route_table_id: Some("ocid1.routetable.oc1.phx.aaaaaaaart".to_string()),
            dns_zone_id: Some("ocid1.dns-zone.oc1.phx.aaaaaaaazone".to_string()),
            ..Default::default()
        };
        assert_eq!(status.validate(), Ok(()));

        let too_long = OCIPrivateEndpointStatus {
            dns_zone_id: Some("a".repeat(256)),
            ..Default::default()
        };
        let errors = too_long.validate().unwrap_err();
        assert!(matches!(&errors[0], ValidationError::Length { field, len: 256, .. } if field == "dnsZoneID"));
    }

    #[test]
    fn test_crd_metadata() {
        let crd = OCIPrivateEndpoint::crd();
        assert_eq!(crd.spec.group, "hypershift.openshift.io");
        assert_eq!(crd.spec.names.kind, "OCIPrivateEndpoint");
        assert_eq!(crd.spec.names.plural, "ociprivateendpoints");
        assert_eq!(crd.spec.names.short_names, Some(vec!["ocipe".to_string()]));

        let version = &crd.spec.versions[0];
        assert_eq!(version.name, "v1beta1");
        assert!(version.subresources.as_ref().unwrap().status.is_some());

        let columns = version.additional_printer_columns.as_ref().unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Network Load Balancer IP", "Service Gateway", "Available", "Age"]);
    }

    #[test]
    fn test_crd_schema_constraints() {
        let crd = OCIPrivateEndpoint::crd();
        let schema = serde_json::to_value(
            &crd.spec.versions[0].schema.as_ref().unwrap().open_api_v3_schema,
        )
        .unwrap();

        let spec = &schema["properties"]["spec"]["properties"];
        assert_eq!(spec["allowedCIDRs"]["maxItems"], 50);
        assert_eq!(spec["allowedCIDRs"]["items"]["maxLength"], 43);
        assert_eq!(spec["reservedIP"]["maxLength"], 15);
        assert!(spec.get("serviceGateway").is_some());
        assert_eq!(spec["customerVCN"]["properties"]["ocid"]["minLength"], 1);
        assert_eq!(spec["customerVCN"]["properties"]["ocid"]["maxLength"], 255);

        let status = &schema["properties"]["status"]["properties"];
        for field in ["serviceGatewayID", "routeTableID", "dnsZoneID"] {
            assert_eq!(status[field]["maxLength"], 255, "{field}");
            assert!(status[field].get("pattern").is_none(), "{field}");
        }

        let conditions = &schema["properties"]["status"]["properties"]["conditions"];
        assert_eq!(conditions["maxItems"], 10);
        assert_eq!(conditions["x-kubernetes-list-type"], "map");
    }
}
