//! Output shapes for the mongo, dynamo, firestore and couch renderers.

use crate::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn users() -> Collection {
    Collection::new("users")
}

fn f(path: &str) -> Field {
    Field::new("users", path)
}

fn p(name: &str) -> Param {
    Param::new(name)
}

fn status_query() -> Builder {
    find(users())
        .filter(eq(f("status"), p("status")))
        .sort_desc(f("createdAt"))
        .limit(10)
}

// ==================== mongo ====================

#[test]
fn test_mongo_find() {
    let result = find(users())
        .filter(eq(f("status"), p("status")))
        .select([f("name"), f("email")])
        .sort_desc(f("createdAt"))
        .skip(20)
        .limit(10)
        .must_render(&MongoRenderer);

    assert_eq!(
        result.value().unwrap(),
        json!({
            "collection": "users",
            "operation": "FIND",
            "filter": { "status": { "$eq": ":status" } },
            "projection": { "name": 1, "email": 1 },
            "sort": { "createdAt": -1 },
            "skip": 20,
            "limit": 10,
        })
    );
    assert_eq!(result.required_params, vec!["status"]);
}

#[test]
fn test_mongo_find_without_filter_renders_empty_filter() {
    let result = find(users()).must_render(&MongoRenderer);
    let value = result.value().unwrap();
    assert_eq!(value["filter"], json!({}));
    assert!(result.required_params.is_empty());
}

#[test]
fn test_mongo_sort_keeps_call_order() {
    let result = find(users())
        .sort_desc(f("score"))
        .sort_asc(f("name"))
        .must_render(&MongoRenderer);
    assert!(result.json.contains(r#""sort":{"score":-1,"name":1}"#));
}

#[test]
fn test_mongo_param_pagination() {
    let result = find(users())
        .skip_param(p("offset"))
        .limit_param(p("page_size"))
        .must_render(&MongoRenderer);
    let value = result.value().unwrap();
    assert_eq!(value["skip"], json!(":offset"));
    assert_eq!(value["limit"], json!(":page_size"));
    assert_eq!(result.required_params, vec!["offset", "page_size"]);
}

#[test]
fn test_mongo_groups_and_ranges() {
    let result = find(users())
        .filter(or([
            eq(f("role"), p("role")),
            range(f("age"), Some(p("min_age")), None),
            range_exclusive(f("score"), Some(p("lo")), Some(p("hi"))),
        ]))
        .must_render(&MongoRenderer);

    assert_eq!(
        result.value().unwrap()["filter"],
        json!({
            "$or": [
                { "role": { "$eq": ":role" } },
                { "age": { "$gte": ":min_age" } },
                { "score": { "$gt": ":lo", "$lt": ":hi" } },
            ]
        })
    );
    assert_eq!(result.required_params, vec!["role", "min_age", "lo", "hi"]);
}

#[test]
fn test_mongo_regex_exists_text() {
    let result = find(users())
        .filter(and([
            regex_with_options(f("name"), p("pattern"), p("flags")),
            exists(f("email")),
            not_exists(f("deletedAt")),
            text_search(p("q")),
        ]))
        .must_render(&MongoRenderer);

    assert_eq!(
        result.value().unwrap()["filter"],
        json!({
            "$and": [
                { "name": { "$regex": ":pattern", "$options": ":flags" } },
                { "email": { "$exists": true } },
                { "deletedAt": { "$exists": false } },
                { "$text": { "$search": ":q" } },
            ]
        })
    );
}

#[test]
fn test_mongo_geo_and_arrays() {
    let result = find(users())
        .filter(and([
            geo(f("location"), p("lon"), p("lat"), p("radius")),
            all(f("tags"), p("tags")),
            elem_match(f("orders"), [gt(f("total"), p("min_total")), eq(f("state"), p("state"))]),
        ]))
        .must_render(&MongoRenderer);

    assert_eq!(
        result.value().unwrap()["filter"],
        json!({
            "$and": [
                { "location": { "$near": {
                    "$geometry": { "type": "Point", "coordinates": [":lon", ":lat"] },
                    "$maxDistance": ":radius",
                } } },
                { "tags": { "$all": ":tags" } },
                { "orders": { "$elemMatch": {
                    "total": { "$gt": ":min_total" },
                    "state": { "$eq": ":state" },
                } } },
            ]
        })
    );
    assert_eq!(
        result.required_params,
        vec!["lon", "lat", "radius", "tags", "min_total", "state"]
    );
}

#[test]
fn test_mongo_projection_slice_and_elem_match() {
    let projection = Projection {
        fields: vec![
            ProjectionField::include(f("name")),
            ProjectionField::slice(f("comments"), p("n"), Some(p("offset"))),
            ProjectionField::elem_match(f("scores"), vec![gte(f("value"), p("min"))]),
        ],
        exclude: false,
    };
    let result = find(users()).projection(projection).must_render(&MongoRenderer);

    assert_eq!(
        result.value().unwrap()["projection"],
        json!({
            "name": 1,
            "comments": { "$slice": [":offset", ":n"] },
            "scores": { "$elemMatch": { "value": { "$gte": ":min" } } },
        })
    );
}

#[test]
fn test_mongo_elem_match_merges_bounds_on_one_field() {
    let result = find(users())
        .filter(elem_match(f("scores"), [gte(f("score"), p("lo")), lt(f("score"), p("hi"))]))
        .must_render(&MongoRenderer);

    assert_eq!(
        result.value().unwrap()["filter"],
        json!({ "scores": { "$elemMatch": { "score": { "$gte": ":lo", "$lt": ":hi" } } } })
    );
    assert_eq!(result.required_params, vec!["lo", "hi"]);
}

#[test]
fn test_mongo_elem_match_repeated_operator_uses_and() {
    let result = find(users())
        .filter(elem_match(f("scores"), [eq(f("score"), p("a")), eq(f("score"), p("b"))]))
        .must_render(&MongoRenderer);

    assert_eq!(
        result.value().unwrap()["filter"],
        json!({ "scores": { "$elemMatch": { "$and": [
            { "score": { "$eq": ":a" } },
            { "score": { "$eq": ":b" } },
        ] } } })
    );
    assert_eq!(result.required_params, vec!["a", "b"]);
}

#[test]
fn test_mongo_projection_elem_match_keeps_every_bound() {
    let projection = Projection {
        fields: vec![ProjectionField::elem_match(
            f("scores"),
            vec![gte(f("value"), p("min")), lte(f("value"), p("max"))],
        )],
        exclude: false,
    };
    let result = find(users()).projection(projection).must_render(&MongoRenderer);

    assert_eq!(
        result.value().unwrap()["projection"],
        json!({ "scores": { "$elemMatch": { "value": { "$gte": ":min", "$lte": ":max" } } } })
    );
    assert_eq!(result.required_params, vec!["min", "max"]);
}

#[test]
fn test_mongo_geo_distance_bounds() {
    let near = |radius: Option<Param>, max_distance: Option<Param>| {
        FilterItem::Geo(GeoFilter {
            field: f("location"),
            operator: FilterOperator::Near,
            center: GeoPoint { lon: p("lon"), lat: p("lat") },
            radius,
            max_distance,
            min_distance: None,
        })
    };

    let result = find(users())
        .filter(near(None, Some(p("max"))))
        .must_render(&MongoRenderer);
    assert_eq!(
        result.value().unwrap()["filter"]["location"]["$near"]["$maxDistance"],
        json!(":max")
    );
    assert_eq!(result.required_params, vec!["lon", "lat", "max"]);

    let err = find(users())
        .filter(near(Some(p("radius")), Some(p("max"))))
        .render(&MongoRenderer)
        .unwrap_err();
    assert!(matches!(err, DocqlError::Builder(_)), "{err}");
    assert!(err.to_string().contains("both radius and max_distance"), "{err}");
}

#[test]
fn test_mongo_insert_one_and_many() {
    let one = insert(users())
        .document(doc().set(f("name"), p("name")).set(f("age"), p("age")).build())
        .must_render(&MongoRenderer);
    assert_eq!(
        one.value().unwrap(),
        json!({
            "collection": "users",
            "operation": "INSERT",
            "document": { "age": ":age", "name": ":name" },
        })
    );
    // Document fields iterate in path order.
    assert_eq!(one.required_params, vec!["age", "name"]);

    let many = insert_many(users())
        .documents([
            doc().set(f("name"), p("first")).build(),
            doc().set(f("name"), p("second")).build(),
        ])
        .must_render(&MongoRenderer);
    assert_eq!(
        many.value().unwrap()["documents"],
        json!([{ "name": ":first" }, { "name": ":second" }])
    );
    assert_eq!(many.required_params, vec!["first", "second"]);
}

#[test]
fn test_mongo_update_operators() {
    let result = update(users())
        .filter(eq(f("id"), p("id")))
        .set(f("name"), p("name"))
        .inc(f("visits"), p("step"))
        .unset([f("nickname")])
        .set(f("email"), p("email"))
        .upsert()
        .must_render(&MongoRenderer);

    assert_eq!(
        result.value().unwrap(),
        json!({
            "collection": "users",
            "operation": "UPDATE",
            "filter": { "id": { "$eq": ":id" } },
            "update": {
                "$set": { "email": ":email", "name": ":name" },
                "$inc": { "visits": ":step" },
                "$unset": { "nickname": "" },
            },
            "upsert": true,
        })
    );
    assert_eq!(result.required_params, vec!["id", "email", "name", "step"]);
}

#[test]
fn test_mongo_delete_count_distinct() {
    let delete = delete_many(users())
        .filter(lt(f("lastSeen"), p("cutoff")))
        .must_render(&MongoRenderer);
    assert_eq!(
        delete.value().unwrap(),
        json!({
            "collection": "users",
            "operation": "DELETE_MANY",
            "filter": { "lastSeen": { "$lt": ":cutoff" } },
        })
    );

    let counted = count(users()).must_render(&MongoRenderer);
    assert_eq!(counted.value().unwrap()["filter"], json!({}));

    let values = distinct(users(), f("country"))
        .filter(eq(f("status"), p("status")))
        .must_render(&MongoRenderer);
    assert_eq!(
        values.value().unwrap(),
        json!({
            "collection": "users",
            "operation": "DISTINCT",
            "field": "country",
            "filter": { "status": { "$eq": ":status" } },
        })
    );
}

#[test]
fn test_mongo_pipeline() {
    let orders = Collection::new("orders");
    let o = |path: &str| Field::new("orders", path);

    let result = aggregate(orders)
        .match_(eq(o("status"), p("status")))
        .lookup(Collection::new("users"), o("userId"), f("id"), "buyer")
        .unwind(o("buyer"))
        .group(
            Some(field_expr(o("buyer.country"))),
            [("revenue", sum(field_expr(o("total")))), ("orders", count_acc())],
        )
        .must_render(&MongoRenderer);

    assert_eq!(
        result.value().unwrap()["pipeline"],
        json!([
            { "$match": { "status": { "$eq": ":status" } } },
            { "$lookup": {
                "from": "users",
                "localField": "userId",
                "foreignField": "id",
                "as": "buyer",
            } },
            { "$unwind": { "path": "$buyer" } },
            { "$group": {
                "_id": "$buyer.country",
                "orders": { "$count": {} },
                "revenue": { "$sum": "$total" },
            } },
        ])
    );
    assert_eq!(result.required_params, vec!["status"]);
}

#[test]
fn test_mongo_group_without_id_is_null() {
    let result = aggregate(users())
        .group(None, [("n", count_acc())])
        .must_render(&MongoRenderer);
    assert_eq!(
        result.value().unwrap()["pipeline"],
        json!([{ "$group": { "_id": null, "n": { "$count": {} } } }])
    );
}

#[test]
fn test_mongo_expressions() {
    let mut fields = std::collections::BTreeMap::new();
    fields.insert(
        "label".to_string(),
        cond_expr(
            op_expr("$gte", [field_expr(f("score")), literal_expr(p("threshold"))]),
            literal_expr(p("pass")),
            literal_expr(p("fail")),
        ),
    );
    let result = aggregate(users())
        .stage(PipelineStage::AddFields(AddFieldsStage { fields }))
        .must_render(&MongoRenderer);

    assert_eq!(
        result.value().unwrap()["pipeline"],
        json!([{ "$addFields": { "label": { "$cond": {
            "if": { "$gte": ["$score", ":threshold"] },
            "then": ":pass",
            "else": ":fail",
        } } } }])
    );
    assert_eq!(result.required_params, vec!["threshold", "pass", "fail"]);
}

#[test]
fn test_mongo_rejects_bad_expression_operator() {
    let stage = PipelineStage::ReplaceRoot(ReplaceRootStage {
        new_root: op_expr("mergeObjects", [field_expr(f("profile"))]),
    });
    let err = aggregate(users())
        .stage(stage)
        .render(&MongoRenderer)
        .unwrap_err();
    assert!(matches!(err, DocqlError::InvalidIdentifier { .. }), "{err}");
}

// ==================== dynamo ====================

#[test]
fn test_dynamo_find() {
    let result = find(users())
        .filter(and([eq(f("status"), p("status")), gt(f("age"), p("min_age"))]))
        .select([f("name")])
        .limit(5)
        .must_render(&DynamoRenderer);

    assert_eq!(
        result.value().unwrap(),
        json!({
            "TableName": "users",
            "FilterExpression": "(#n0 = :v0) AND (#n1 > :v1)",
            "ExpressionAttributeNames": { "#n0": "status", "#n1": "age", "#n2": "name" },
            "ExpressionAttributeValues": { ":v0": ":status", ":v1": ":min_age" },
            "Limit": 5,
            "ProjectionExpression": "#n2",
        })
    );
    assert_eq!(result.required_params, vec!["status", "min_age"]);
}

#[test]
fn test_dynamo_ignores_sort_and_skip() {
    let result = status_query().skip(5).must_render(&DynamoRenderer);
    let value = result.value().unwrap();
    assert_eq!(value["FilterExpression"], json!("#n0 = :v0"));
    assert_eq!(value["Limit"], json!(10));
    assert!(value.get("sort").is_none());
    assert!(!result.json.contains("createdAt"));
}

#[test]
fn test_dynamo_range_and_exists() {
    let result = find(users())
        .filter(or([
            range(f("age"), Some(p("lo")), Some(p("hi"))),
            not_exists(f("age")),
        ]))
        .must_render(&DynamoRenderer);
    assert_eq!(
        result.value().unwrap()["FilterExpression"],
        json!("(#n0 >= :v0 AND #n0 <= :v1) OR (attribute_not_exists(#n1))")
    );
}

#[test]
fn test_dynamo_insert() {
    let result = insert(users())
        .document(doc().set(f("id"), p("id")).set(f("name"), p("name")).build())
        .must_render(&DynamoRenderer);
    assert_eq!(
        result.value().unwrap(),
        json!({ "TableName": "users", "Item": { "id": ":id", "name": ":name" } })
    );
}

#[test]
fn test_dynamo_update_expression() {
    let result = update(users())
        .filter(eq(f("id"), p("id")))
        .set(f("name"), p("name"))
        .inc(f("visits"), p("step"))
        .unset([f("nickname")])
        .must_render(&DynamoRenderer);

    assert_eq!(
        result.value().unwrap(),
        json!({
            "TableName": "users",
            "UpdateExpression": "SET #n1 = :v1, #n2 = #n2 + :v2 REMOVE #n3",
            "ConditionExpression": "#n0 = :v0",
            "ExpressionAttributeNames": {
                "#n0": "id",
                "#n1": "name",
                "#n2": "visits",
                "#n3": "nickname",
            },
            "ExpressionAttributeValues": { ":v0": ":id", ":v1": ":name", ":v2": ":step" },
        })
    );
    assert_eq!(result.required_params, vec!["id", "name", "step"]);
}

#[test]
fn test_dynamo_delete() {
    let result = delete(users())
        .filter(eq(f("id"), p("id")))
        .must_render(&DynamoRenderer);
    assert_eq!(
        result.value().unwrap(),
        json!({
            "TableName": "users",
            "ConditionExpression": "#n0 = :v0",
            "ExpressionAttributeNames": { "#n0": "id" },
            "ExpressionAttributeValues": { ":v0": ":id" },
        })
    );
}

// ==================== firestore ====================

#[test]
fn test_firestore_find() {
    let result = find(users())
        .filter(and([
            eq(f("status"), p("status")),
            range(f("age"), Some(p("lo")), Some(p("hi"))),
            all(f("tags"), p("tag")),
        ]))
        .sort_asc(f("name"))
        .limit(20)
        .skip(40)
        .select([f("name"), f("age")])
        .must_render(&FirestoreRenderer);

    assert_eq!(
        result.value().unwrap(),
        json!({
            "collection": "users",
            "operation": "FIND",
            "where": [
                { "field": "status", "operator": "==", "value": ":status" },
                { "field": "age", "operator": ">=", "value": ":lo" },
                { "field": "age", "operator": "<=", "value": ":hi" },
                { "field": "tags", "operator": "array-contains", "value": ":tag" },
            ],
            "orderBy": [{ "field": "name", "direction": "asc" }],
            "limit": 20,
            "offset": 40,
            "select": ["name", "age"],
        })
    );
    assert_eq!(result.required_params, vec!["status", "lo", "hi", "tag"]);
}

#[test]
fn test_firestore_insert() {
    let result = insert(users())
        .document(doc().set(f("name"), p("name")).build())
        .must_render(&FirestoreRenderer);
    assert_eq!(
        result.value().unwrap(),
        json!({ "collection": "users", "operation": "INSERT", "data": { "name": ":name" } })
    );
}

#[test]
fn test_firestore_update_deletes_unset_fields() {
    let result = update(users())
        .filter(eq(f("id"), p("id")))
        .set(f("name"), p("name"))
        .unset([f("nickname")])
        .must_render(&FirestoreRenderer);

    assert_eq!(
        result.value().unwrap(),
        json!({
            "collection": "users",
            "operation": "UPDATE",
            "where": [{ "field": "id", "operator": "==", "value": ":id" }],
            "data": { "name": ":name", "nickname": "FieldValue.delete()" },
        })
    );
    assert_eq!(result.required_params, vec!["id", "name"]);
}

#[test]
fn test_firestore_rejects_set_and_unset_on_one_field() {
    let err = update(users())
        .filter(eq(f("id"), p("id")))
        .set(f("nickname"), p("nickname"))
        .unset([f("nickname")])
        .render(&FirestoreRenderer)
        .unwrap_err();
    assert!(matches!(err, DocqlError::Builder(_)), "{err}");
    assert!(err.to_string().contains("'nickname' is both set and unset"), "{err}");
}

#[test]
fn test_firestore_not_group_falls_back_to_and() {
    let filter = FilterItem::Group(FilterGroup {
        logic: LogicOperator::Not,
        conditions: vec![eq(f("status"), p("status")), lt(f("age"), p("age"))],
    });
    let result = find(users()).filter(filter).must_render(&FirestoreRenderer);
    assert_eq!(
        result.value().unwrap()["where"],
        json!([
            { "field": "status", "operator": "==", "value": ":status" },
            { "field": "age", "operator": "<", "value": ":age" },
        ])
    );
}

// ==================== couch ====================

#[test]
fn test_couch_find() {
    let result = status_query().must_render(&CouchRenderer);
    assert_eq!(
        result.value().unwrap(),
        json!({
            "database": "users",
            "selector": { "status": { "$eq": ":status" } },
            "sort": [{ "createdAt": "desc" }],
            "limit": 10,
        })
    );
    assert_eq!(result.required_params, vec!["status"]);
}

#[test]
fn test_couch_selector_shapes() {
    let result = find(users())
        .filter(nor([
            is_in(f("role"), p("roles")),
            regex(f("name"), p("pattern")),
            range(f("age"), None, Some(p("max_age"))),
            exists(f("email")),
        ]))
        .select([f("name")])
        .skip(10)
        .must_render(&CouchRenderer);

    assert_eq!(
        result.value().unwrap(),
        json!({
            "database": "users",
            "selector": { "$nor": [
                { "role": { "$in": ":roles" } },
                { "name": { "$regex": ":pattern" } },
                { "age": { "$lte": ":max_age" } },
                { "email": { "$exists": true } },
            ] },
            "fields": ["name"],
            "skip": 10,
        })
    );
}

#[test]
fn test_couch_writes() {
    let inserted = insert(users())
        .document(doc().set(f("name"), p("name")).build())
        .must_render(&CouchRenderer);
    assert_eq!(
        inserted.value().unwrap(),
        json!({ "database": "users", "operation": "insert", "doc": { "name": ":name" } })
    );

    let updated = update(users())
        .filter(eq(f("id"), p("id")))
        .set(f("name"), p("name"))
        .must_render(&CouchRenderer);
    assert_eq!(
        updated.value().unwrap(),
        json!({
            "database": "users",
            "operation": "update",
            "selector": { "id": { "$eq": ":id" } },
            "updates": { "name": ":name" },
        })
    );

    let deleted = delete(users()).must_render(&CouchRenderer);
    assert_eq!(
        deleted.value().unwrap(),
        json!({ "database": "users", "operation": "delete" })
    );
}

// ==================== all dialects ====================

#[test]
fn test_render_is_idempotent() {
    let ast = status_query().must_build();
    for dialect in Dialect::ALL {
        let renderer = dialect.renderer();
        let first = renderer.render(&ast).unwrap();
        let second = renderer.render(&ast).unwrap();
        assert_eq!(first, second, "{dialect}");
    }
}

#[test]
fn test_params_follow_traversal_order_with_duplicates() {
    let result = find(users())
        .filter(or([eq(f("a"), p("x")), eq(f("b"), p("y")), eq(f("c"), p("x"))]))
        .must_render(&MongoRenderer);
    assert_eq!(result.required_params, vec!["x", "y", "x"]);
}

#[test]
fn test_output_never_contains_raw_values() {
    let result = update(users())
        .filter(eq(f("id"), p("user_id")))
        .set(f("name"), p("new_name"))
        .must_render(&MongoRenderer);
    for name in &result.required_params {
        assert!(result.json.contains(&format!("\":{name}\"")));
    }
}
