#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();

        assert!(components.schemas.contains_key("ErrorResponse"));
        assert!(components.schemas.contains_key("HealthResponse"));

        let json = serde_json::to_value(&openapi).unwrap();
        assert_eq!(json["info"]["title"], "Dialysis Directory API");
    }

    #[test]
    fn test_error_response_schema_structure() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let error_response_schema = components.schemas.get("ErrorResponse").unwrap();

        if let utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj)) = error_response_schema {
            let properties = &obj.properties;
            assert!(properties.contains_key("error"));
            assert!(properties.contains_key("code"));
            assert!(properties.contains_key("success"));
        } else {
            panic!("ErrorResponse should be an object schema");
        }
    }

    #[test]
    fn test_health_response_schema_structure() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        let health_response_schema = components.schemas.get("HealthResponse").unwrap();

        if let utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj)) = health_response_schema {
            let properties = &obj.properties;
            assert!(properties.contains_key("status"));
            assert!(properties.contains_key("version"));
            assert!(properties.contains_key("database"));
            assert!(properties.contains_key("rate_limit_store"));
        } else {
            panic!("HealthResponse should be an object schema");
        }
    }

    #[test]
    fn test_openapi_paths_contain_health_endpoint() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.paths.paths.contains_key("/health"));

        let health_path = openapi.paths.paths.get("/health").unwrap();
        let health_get = health_path.operations.get(&utoipa::openapi::PathItemType::Get);
        assert!(health_get.is_some());

        let responses = &health_get.unwrap().responses;
        assert!(responses.responses.contains_key("200"));
        assert!(responses.responses.contains_key("503"));
    }

    #[test]
    fn test_lead_submission_documents_rate_limit() {
        let openapi = ApiDoc::openapi();

        let leads = openapi.paths.paths.get("/api/leads").unwrap();
        let post = leads
            .operations
            .get(&utoipa::openapi::PathItemType::Post)
            .expect("POST /api/leads should be documented");

        assert!(post.responses.responses.contains_key("201"));
        assert!(post.responses.responses.contains_key("429"));
    }

    #[test]
    fn test_reorder_endpoint_documents_auth_failures() {
        let openapi = ApiDoc::openapi();

        let reorder = openapi
            .paths
            .paths
            .get("/api/centers/{id}/images/reorder")
            .unwrap();
        let put = reorder
            .operations
            .get(&utoipa::openapi::PathItemType::Put)
            .unwrap();

        for status in ["200", "400", "401", "403", "404"] {
            assert!(put.responses.responses.contains_key(status), "missing {}", status);
        }
    }

    #[test]
    fn test_directory_schemas_are_registered() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();

        for name in [
            "StateSummary",
            "CenterSummary",
            "CenterDetail",
            "MapMarker",
            "NeighboringLocation",
            "ReorderImagesRequest",
            "ImageResponse",
            "CreateLeadRequest",
            "SignUpRequest",
            "AdminSummary",
        ] {
            assert!(components.schemas.contains_key(name), "missing schema {}", name);
        }
    }
}
