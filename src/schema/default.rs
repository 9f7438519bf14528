use crate::datom::*;
use crate::schema::attribute::*;
use crate::schema::*;

/// Attributes present in every database, keyed by their reserved ID.
pub fn default_attributes() -> Vec<(u64, AttributeDefinition)> {
    use ValueType::*;
    let attribute = |ident: &str, value_type: ValueType, doc: &str| AttributeDefinition::new(ident, value_type).with_doc(doc);
    vec![
        (DB_ATTR_IDENT_ID, attribute(DB_ATTR_IDENT_IDENT, Str, "Human readable name of attribute").unique()),
        (DB_ATTR_CARDINALITY_ID, attribute(DB_ATTR_CARDINALITY_IDENT, U64, "Cardinality of attribute")),
        (DB_ATTR_TYPE_ID, attribute(DB_ATTR_TYPE_IDENT, U64, "Data type of attribute")),
        (DB_ATTR_DOC_ID, attribute(DB_ATTR_DOC_IDENT, Str, "Documentation of attribute")),
        (DB_ATTR_UNIQUE_ID, attribute(DB_ATTR_UNIQUE_IDENT, U64, "Indicates this attribute is unique")),
        (DB_TX_TIME_ID, attribute(DB_TX_TIME_IDENT, U64, "Transaction's wall clock time")),
        // Definitions
        (CUSTOM_ATTRIBUTE_NAME_ID, attribute(CUSTOM_ATTRIBUTE_NAME_IDENT, Str, "Name shown for the custom attribute")),
        (CUSTOM_ATTRIBUTE_TYPE_ID, attribute(CUSTOM_ATTRIBUTE_TYPE_IDENT, U64, "Kind of field, see `AttrType`")),
        (CUSTOM_ATTRIBUTE_DEFAULT_VALUE_ID, attribute(CUSTOM_ATTRIBUTE_DEFAULT_VALUE_IDENT, Str, "Default value of non dropdown fields")),
        (CUSTOM_ATTRIBUTE_DEFAULT_OPTION_ID, attribute(CUSTOM_ATTRIBUTE_DEFAULT_OPTION_IDENT, Ref, "Default option of dropdown fields")),
        (CUSTOM_ATTRIBUTE_UNIQUE_ID, attribute(CUSTOM_ATTRIBUTE_UNIQUE_IDENT, U64, "Values must be distinct across records")),
        (CUSTOM_ATTRIBUTE_SORT_ORDER_ID, attribute(CUSTOM_ATTRIBUTE_SORT_ORDER_IDENT, I64, "Position in listings")),
        // Options
        (OPTION_DEFINITION_ID, attribute(OPTION_DEFINITION_IDENT, Ref, "Custom attribute owning the option")),
        (OPTION_LABEL_ID, attribute(OPTION_LABEL_IDENT, Str, "Label of the option")),
        // Values
        (VALUE_DEFINITION_ID, attribute(VALUE_DEFINITION_IDENT, Ref, "Custom attribute of the value")),
        (VALUE_RECORD_ID, attribute(VALUE_RECORD_IDENT, U64, "Parent record holding the value")),
        (VALUE_STRING_ID, attribute(VALUE_STRING_IDENT, Str, "Value of text fields")),
        (VALUE_INTEGER_ID, attribute(VALUE_INTEGER_IDENT, I64, "Value of number fields")),
        (VALUE_DOUBLE_ID, attribute(VALUE_DOUBLE_IDENT, Decimal, "Value of decimal fields")),
    ]
}

/// Bootstrap transaction, installed with tx ID 0.
pub fn default_datoms() -> Vec<Datom> {
    let tx = 0;
    let mut datoms = vec![Datom::add(tx, DB_TX_TIME_ID, 0u64, tx)];
    for (id, attribute) in default_attributes() {
        datoms.extend(attribute.datoms(id, tx));
    }
    datoms
}
