//! Pipeline stage and expression builders.

use bson::{Bson, Document, doc};

use crate::sort::SortDirection;

/// `$match`.
pub fn match_stage(filter: Document) -> Document {
    doc! { "$match": filter }
}

/// `$match` when the filter restricts anything.
pub fn optional_match(filter: Option<Document>) -> Option<Document> {
    filter.filter(|f| !f.is_empty()).map(match_stage)
}

/// `$group` with the given `_id` and accumulators.
pub fn group(id: impl Into<Bson>, accumulators: Document) -> Document {
    let mut group_doc = doc! { "_id": id.into() };
    for (key, value) in accumulators {
        group_doc.insert(key, value);
    }
    doc! { "$group": group_doc }
}

/// `$sort` on a single key.
pub fn sort_by(field: &str, direction: SortDirection) -> Document {
    let mut keys = Document::new();
    keys.insert(field, direction);
    doc! { "$sort": keys }
}

/// `$project`.
pub fn project(fields: Document) -> Document {
    doc! { "$project": fields }
}

/// `$setWindowFields`.
pub fn set_window_fields(partition_by: impl Into<Bson>, sort_by: Document, output: Document) -> Document {
    doc! {
        "$setWindowFields": {
            "partitionBy": partition_by.into(),
            "sortBy": sort_by,
            "output": output,
        }
    }
}

/// Field path expression, `"$field"`.
pub fn path(field: &str) -> Bson {
    Bson::String(format!("${field}"))
}

/// `$dateTrunc` to buckets of `minutes` minutes.
pub fn date_trunc_minutes(date_field: &str, minutes: u32) -> Bson {
    Bson::Document(doc! {
        "$dateTrunc": {
            "date": path(date_field),
            "unit": "minute",
            "binSize": i64::from(minutes),
        }
    })
}

/// Accumulators for `$group` and window outputs.
pub mod accumulators {
    use bson::{Bson, doc};

    /// `$sum`.
    pub fn sum(expr: impl Into<Bson>) -> Bson {
        Bson::Document(doc! { "$sum": expr.into() })
    }

    /// `$avg`.
    pub fn avg(expr: impl Into<Bson>) -> Bson {
        Bson::Document(doc! { "$avg": expr.into() })
    }

    /// `$min`.
    pub fn min(expr: impl Into<Bson>) -> Bson {
        Bson::Document(doc! { "$min": expr.into() })
    }

    /// `$max`.
    pub fn max(expr: impl Into<Bson>) -> Bson {
        Bson::Document(doc! { "$max": expr.into() })
    }

    /// `$first`.
    pub fn first(expr: impl Into<Bson>) -> Bson {
        Bson::Document(doc! { "$first": expr.into() })
    }

    /// `$last`.
    pub fn last(expr: impl Into<Bson>) -> Bson {
        Bson::Document(doc! { "$last": expr.into() })
    }

    /// `$push`.
    pub fn push(expr: impl Into<Bson>) -> Bson {
        Bson::Document(doc! { "$push": expr.into() })
    }
}
