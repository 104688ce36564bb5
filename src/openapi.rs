// src/openapi.rs
//! Operation Assembler: API shape types → an OpenAPI document.
//!
//! An API shape is a declared object type with `path`, `method` and `responses` members,
//! plus optional `params`, `query`, `body` and `security`. Their schemas come from the same
//! builder as [`SchemaGenerator::get_schemas`](crate::generator::SchemaGenerator::get_schemas),
//! with references pointing into `components.schemas`.

mod assembler;
mod document;

pub use document::{
    Components, ExternalDocumentation, HttpMethod, Info, MediaType, OpenApiDocument, Operation,
    Parameter, ParameterLocation, PathItem, RequestBody, Response, SecurityRequirement, Server,
    SpecData, Tag,
};

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::SpecData;
    use crate::config::Options;
    use crate::definition::Definition;
    use crate::error::Error;
    use crate::generator::{SchemaGenerator, TypeNamePattern};
    use crate::graph::{GraphBuilder, Prop, TypeGraph, TypeId};

    /// `{ path, method, responses: { "200": { msg: string } } }` plus extra members.
    fn shape(
        b: &mut GraphBuilder,
        name: &str,
        path: &str,
        method: &str,
        extra: Vec<Prop>,
    ) -> TypeId {
        let string = b.string();
        let msg = b.type_literal().prop(Prop::new("msg", string)).build();
        let responses = b.type_literal().prop(Prop::new("200", msg)).build();
        let (path, method) = (b.string_literal(path), b.string_literal(method));
        let mut shape = b
            .type_literal()
            .alias(name)
            .prop(Prop::new("path", path))
            .prop(Prop::new("method", method))
            .prop(Prop::new("responses", responses));
        for prop in extra {
            shape = shape.prop(prop);
        }
        shape.build()
    }

    fn assemble(
        graph: TypeGraph,
        options: Options,
        names: &[&str],
        spec_data: SpecData,
    ) -> Result<Value, Error> {
        let generator = SchemaGenerator::new(graph, options)?;
        let patterns =
            names.iter().map(|n| TypeNamePattern::parse(n)).collect::<Result<Vec<_>, _>>()?;
        let document = generator.get_openapi_spec(&patterns, spec_data)?;
        Ok(serde_json::to_value(&document).unwrap())
    }

    fn assemble_plain(graph: TypeGraph, names: &[&str]) -> Result<Value, Error> {
        assemble(graph, Options::default(), names, SpecData::default())
    }

    #[test]
    fn minimal_shape() {
        let mut b = GraphBuilder::new();
        shape(&mut b, "GetX", "/x", "GET", vec![]);
        let doc = assemble_plain(b.finish(), &["GetX"]).unwrap();

        assert_eq!(doc["openapi"], json!("3.0.3"));
        assert_eq!(doc["info"]["title"], json!("OpenAPI specification"));
        let get = &doc["paths"]["/x"]["get"];
        assert_eq!(get["operationId"], json!("GetX"));
        assert_eq!(get["responses"]["200"]["description"], json!(""));
        let schema = &get["responses"]["200"]["content"]["*/*"]["schema"];
        assert_eq!(schema["properties"]["msg"]["type"], json!("string"));
        assert!(get.get("parameters").is_none());
        assert!(get.get("requestBody").is_none());
    }

    #[test]
    fn methods_share_a_path() {
        let mut b = GraphBuilder::new();
        shape(&mut b, "ListBooks", "/books", "GET", vec![]);
        shape(&mut b, "AddBook", "/books", "POST", vec![]);
        let doc = assemble_plain(b.finish(), &["/Book/"]).unwrap();
        let item = doc["paths"]["/books"].as_object().unwrap();
        assert_eq!(item.keys().collect::<Vec<_>>(), ["get", "post"]);
    }

    #[test]
    fn missing_responses_is_an_error() {
        let mut b = GraphBuilder::new();
        let (path, method) = (b.string_literal("/x"), b.string_literal("GET"));
        b.type_literal()
            .alias("Broken")
            .prop(Prop::new("path", path))
            .prop(Prop::new("method", method))
            .build();
        let err = assemble_plain(b.finish(), &["Broken"]).unwrap_err();
        let Error::Shape { shape, reason } = err else {
            panic!("expected a shape error");
        };
        assert_eq!(shape, "Broken");
        assert!(reason.contains("responses"));
    }

    #[test]
    fn unknown_method_is_an_error() {
        let mut b = GraphBuilder::new();
        shape(&mut b, "Fetch", "/x", "FETCH", vec![]);
        let err = assemble_plain(b.finish(), &["Fetch"]).unwrap_err();
        assert!(matches!(err, Error::Shape { .. }));
    }

    #[test]
    fn status_keys_must_be_codes() {
        let mut b = GraphBuilder::new();
        let string = b.string();
        let ok = b.type_literal().prop(Prop::new("msg", string)).build();
        let responses = b.type_literal().prop(Prop::new("600", ok)).build();
        let (path, method) = (b.string_literal("/x"), b.string_literal("GET"));
        b.type_literal()
            .alias("Odd")
            .prop(Prop::new("path", path))
            .prop(Prop::new("method", method))
            .prop(Prop::new("responses", responses))
            .build();
        let err = assemble_plain(b.finish(), &["Odd"]).unwrap_err();
        assert!(matches!(err, Error::InvalidStatusCode { ref status, .. } if status == "600"));
    }

    #[test]
    fn params_query_and_body() {
        let mut b = GraphBuilder::new();
        let (string, number) = (b.string(), b.number());
        let params = b.type_literal().prop(Prop::new("id", string).doc("Book id")).build();
        let query = b.type_literal().prop(Prop::new("limit", number).optional()).build();
        let body = b.type_literal().prop(Prop::new("title", string)).build();
        shape(
            &mut b,
            "UpdateBook",
            "/books/{id}",
            "PUT",
            vec![Prop::new("params", params), Prop::new("query", query), Prop::new("body", body)],
        );
        let doc = assemble_plain(b.finish(), &["UpdateBook"]).unwrap();
        let put = &doc["paths"]["/books/{id}"]["put"];
        assert_eq!(
            put["parameters"],
            json!([
                {
                    "name": "id",
                    "in": "path",
                    "required": true,
                    "description": "Book id",
                    "schema": { "description": "Book id", "type": "string" }
                },
                {
                    "name": "limit",
                    "in": "query",
                    "required": false,
                    "schema": { "type": "number" }
                }
            ])
        );
        assert_eq!(put["requestBody"]["content"]["*/*"]["schema"]["required"], json!(["title"]));
    }

    #[test]
    fn intersected_params_are_flattened() {
        let mut b = GraphBuilder::new();
        let string = b.string();
        let left = b.type_literal().prop(Prop::new("a", string)).build();
        let right = b.type_literal().prop(Prop::new("b", string).optional()).build();
        let both = b.intersection([left, right]);
        shape(&mut b, "Both", "/ab", "GET", vec![Prop::new("query", both)]);
        let doc = assemble_plain(b.finish(), &["Both"]).unwrap();
        let params = doc["paths"]["/ab"]["get"]["parameters"].as_array().unwrap().clone();
        let summary: Vec<(Value, Value)> =
            params.iter().map(|p| (p["name"].clone(), p["required"].clone())).collect();
        assert_eq!(summary, [(json!("a"), json!(true)), (json!("b"), json!(false))]);
    }

    #[test]
    fn non_object_params_are_rejected() {
        let mut b = GraphBuilder::new();
        let string = b.string();
        shape(&mut b, "Bad", "/x", "GET", vec![Prop::new("params", string)]);
        let err = assemble_plain(b.finish(), &["Bad"]).unwrap_err();
        assert!(matches!(err, Error::Shape { ref reason, .. } if reason.contains("params")));
    }

    #[test]
    fn shape_annotations_become_operation_fields() {
        let mut b = GraphBuilder::new();
        let string = b.string();
        let body = b.type_literal().prop(Prop::new("title", string)).build();
        let (path, method) = (b.string_literal("/books"), b.string_literal("POST"));
        let never = b.never();
        let responses = b.type_literal().prop(Prop::new("204", never).doc("Created")).build();
        b.type_literal()
            .alias("CreateBook")
            .doc("Adds a book")
            .tag("summary", Some("Create"))
            .tag("tags", Some("books, admin"))
            .tag("deprecated", None)
            .tag("body.contentType", Some("application/json"))
            .tag("body.description", Some("The new book"))
            .prop(Prop::new("path", path))
            .prop(Prop::new("method", method))
            .prop(Prop::new("body", body))
            .prop(Prop::new("responses", responses))
            .build();
        let doc = assemble_plain(b.finish(), &["CreateBook"]).unwrap();
        let post = &doc["paths"]["/books"]["post"];
        assert_eq!(post["tags"], json!(["books", "admin"]));
        assert_eq!(post["summary"], json!("Create"));
        assert_eq!(post["description"], json!("Adds a book"));
        assert_eq!(post["deprecated"], json!(true));
        assert!(post.get("body").is_none());
        assert_eq!(post["requestBody"]["description"], json!("The new book"));
        assert!(post["requestBody"]["content"]["application/json"]["schema"].is_object());
        assert_eq!(post["responses"]["204"], json!({ "description": "Created" }));
    }

    #[test]
    fn ignored_shape_is_skipped() {
        let mut b = GraphBuilder::new();
        let string = b.string();
        let msg = b.type_literal().prop(Prop::new("msg", string)).build();
        let responses = b.type_literal().prop(Prop::new("200", msg)).build();
        let (path, method) = (b.string_literal("/hidden"), b.string_literal("GET"));
        b.type_literal()
            .alias("Hidden")
            .tag("ignore", None)
            .prop(Prop::new("path", path))
            .prop(Prop::new("method", method))
            .prop(Prop::new("responses", responses))
            .build();
        let doc = assemble_plain(b.finish(), &["Hidden"]).unwrap();
        assert_eq!(doc["paths"], json!({}));
    }

    #[test]
    fn ref_mode_fills_components_with_caller_precedence() {
        let mut b = GraphBuilder::new();
        let (string, number) = (b.string(), b.number());
        let book = b.interface("Book").prop(Prop::new("title", string)).build();
        let author = b.interface("Author").prop(Prop::new("name", string)).build();
        let ok = b
            .type_literal()
            .prop(Prop::new("book", book))
            .prop(Prop::new("author", author))
            .build();
        let responses = b.type_literal().prop(Prop::new("200", ok)).build();
        let (path, method) = (b.string_literal("/book"), b.string_literal("GET"));
        b.type_literal()
            .alias("GetBook")
            .prop(Prop::new("path", path))
            .prop(Prop::new("method", method))
            .prop(Prop::new("responses", responses))
            .prop(Prop::new("count", number).optional())
            .build();

        let spec_data: SpecData = serde_json::from_value(json!({
            "components": { "schemas": { "Author": { "type": "string" } } }
        }))
        .unwrap();
        let options = Options { reference: true, ..Options::default() };
        let doc = assemble(b.finish(), options, &["GetBook"], spec_data).unwrap();

        let schema = &doc["paths"]["/book"]["get"]["responses"]["200"]["content"]["*/*"]["schema"];
        assert_eq!(schema["properties"]["book"], json!({ "$ref": "#/components/schemas/Book" }));
        let schemas = &doc["components"]["schemas"];
        assert_eq!(schemas["Book"]["properties"]["title"], json!({ "type": "string" }));
        assert_eq!(schemas["Author"], json!({ "type": "string" }));
    }

    #[test]
    fn security_scopes_come_from_item_enums() {
        let mut b = GraphBuilder::new();
        let (read, write) = (b.string_literal("read"), b.string_literal("write"));
        let scope = b.union([read, write]);
        let scopes = b.array(scope);
        let requirement = b.type_literal().prop(Prop::new("oauth", scopes)).build();
        let security = b.array(requirement);
        shape(&mut b, "Secure", "/secure", "GET", vec![Prop::new("security", security)]);
        let doc = assemble_plain(b.finish(), &["Secure"]).unwrap();
        let security = &doc["paths"]["/secure"]["get"]["security"];
        assert_eq!(security, &json!([{ "oauth": ["read", "write"] }]));
    }

    #[test]
    fn aliased_scopes_are_followed_in_ref_mode() {
        let mut b = GraphBuilder::new();
        let (read, write) = (b.string_literal("read"), b.string_literal("write"));
        let union = b.union([read, write]);
        let scope = b.alias("Scope", union);
        let scopes = b.array(scope);
        let requirement = b.type_literal().prop(Prop::new("oauth", scopes)).build();
        let security = b.array(requirement);
        shape(&mut b, "Secure", "/secure", "GET", vec![Prop::new("security", security)]);
        let graph = b.finish();

        for reference in [false, true] {
            let options = Options { reference, ..Options::default() };
            let doc = assemble(graph.clone(), options, &["Secure"], SpecData::default()).unwrap();
            let security = &doc["paths"]["/secure"]["get"]["security"];
            assert_eq!(security, &json!([{ "oauth": ["read", "write"] }]), "ref mode {reference}");
        }
    }

    #[test]
    fn no_patterns_yield_no_operations() {
        let mut b = GraphBuilder::new();
        let string = b.string();
        b.interface("Model").prop(Prop::new("name", string)).build();
        let doc = assemble_plain(b.finish(), &[]).unwrap();
        assert_eq!(doc["paths"], json!({}));
    }

    #[test]
    fn custom_operation_properties_are_prefixed() {
        let mut b = GraphBuilder::new();
        let audience = b.string_literal("internal");
        let (rate, string) = (b.number_literal(10.0), b.string());
        shape(
            &mut b,
            "Custom",
            "/c",
            "GET",
            vec![
                Prop::new("audience", audience),
                Prop::new("x-rate", rate),
                Prop::new("note", string),
            ],
        );
        let graph = b.finish();

        let options = Options { custom_operation_properties: true, ..Options::default() };
        let doc = assemble(graph.clone(), options, &["Custom"], SpecData::default()).unwrap();
        let get = &doc["paths"]["/c"]["get"];
        assert_eq!(get["x-audience"], json!("internal"));
        assert_eq!(get["x-rate"], json!(10));
        assert!(get.get("x-note").is_none());

        let doc = assemble_plain(graph, &["Custom"]).unwrap();
        assert!(doc["paths"]["/c"]["get"].get("x-audience").is_none());
    }

    #[test]
    fn schema_overrides_reach_components() {
        let mut b = GraphBuilder::new();
        let number = b.number();
        let money = b.alias("Money", number);
        let ok = b.type_literal().prop(Prop::new("price", money)).build();
        let responses = b.type_literal().prop(Prop::new("200", ok)).build();
        let (path, method) = (b.string_literal("/price"), b.string_literal("GET"));
        b.type_literal()
            .alias("GetPrice")
            .prop(Prop::new("path", path))
            .prop(Prop::new("method", method))
            .prop(Prop::new("responses", responses))
            .build();

        let options = Options { reference: true, ..Options::default() };
        let mut generator = SchemaGenerator::new(b.finish(), options).unwrap();
        generator.set_schema_override("Money", Definition::of_type("string"));
        let doc = generator
            .get_openapi_spec(&[TypeNamePattern::from("GetPrice")], SpecData::default())
            .unwrap();
        assert_eq!(doc.components.schemas["Money"], Definition::of_type("string"));
    }
}
