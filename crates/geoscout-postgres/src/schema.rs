// The `geom` geometry column is only referenced from raw SQL (PostGIS
// functions), so it is not declared here.

diesel::table! {
    use diesel::sql_types::*;
    use pgvector::sql_types::*;

    embeddings (chips_id) {
        chips_id -> Text,
        vec -> Vector,
        geom_wkt -> Text,
        datetime -> Timestamptz,
    }
}
