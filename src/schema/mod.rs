pub mod attribute;
pub mod default;

pub const DB_ATTR_IDENT_IDENT: &str = "db/attr/ident";
pub const DB_ATTR_IDENT_ID: u64 = 1;

pub const DB_ATTR_CARDINALITY_IDENT: &str = "db/attr/cardinality";
pub const DB_ATTR_CARDINALITY_ID: u64 = 2;

pub const DB_ATTR_TYPE_IDENT: &str = "db/attr/type";
pub const DB_ATTR_TYPE_ID: u64 = 3;

pub const DB_ATTR_DOC_IDENT: &str = "db/attr/doc";
pub const DB_ATTR_DOC_ID: u64 = 4;

pub const DB_ATTR_UNIQUE_IDENT: &str = "db/attr/unique";
pub const DB_ATTR_UNIQUE_ID: u64 = 5;

pub const DB_TX_TIME_IDENT: &str = "db/tx/time";
pub const DB_TX_TIME_ID: u64 = 6;

// Custom attribute definitions

pub const CUSTOM_ATTRIBUTE_NAME_IDENT: &str = "custom_attribute/name";
pub const CUSTOM_ATTRIBUTE_NAME_ID: u64 = 10;

pub const CUSTOM_ATTRIBUTE_TYPE_IDENT: &str = "custom_attribute/type";
pub const CUSTOM_ATTRIBUTE_TYPE_ID: u64 = 11;

pub const CUSTOM_ATTRIBUTE_DEFAULT_VALUE_IDENT: &str = "custom_attribute/default_value";
pub const CUSTOM_ATTRIBUTE_DEFAULT_VALUE_ID: u64 = 12;

pub const CUSTOM_ATTRIBUTE_DEFAULT_OPTION_IDENT: &str = "custom_attribute/default_option";
pub const CUSTOM_ATTRIBUTE_DEFAULT_OPTION_ID: u64 = 13;

pub const CUSTOM_ATTRIBUTE_UNIQUE_IDENT: &str = "custom_attribute/unique";
pub const CUSTOM_ATTRIBUTE_UNIQUE_ID: u64 = 14;

pub const CUSTOM_ATTRIBUTE_SORT_ORDER_IDENT: &str = "custom_attribute/sort_order";
pub const CUSTOM_ATTRIBUTE_SORT_ORDER_ID: u64 = 15;

// Custom attribute options

pub const OPTION_DEFINITION_IDENT: &str = "custom_attribute_option/definition";
pub const OPTION_DEFINITION_ID: u64 = 20;

pub const OPTION_LABEL_IDENT: &str = "custom_attribute_option/label";
pub const OPTION_LABEL_ID: u64 = 21;

// Custom attribute values

pub const VALUE_DEFINITION_IDENT: &str = "custom_attribute_value/definition";
pub const VALUE_DEFINITION_ID: u64 = 30;

pub const VALUE_RECORD_IDENT: &str = "custom_attribute_value/record";
pub const VALUE_RECORD_ID: u64 = 31;

pub const VALUE_STRING_IDENT: &str = "custom_attribute_value/string_value";
pub const VALUE_STRING_ID: u64 = 32;

pub const VALUE_INTEGER_IDENT: &str = "custom_attribute_value/integer_value";
pub const VALUE_INTEGER_ID: u64 = 33;

pub const VALUE_DOUBLE_IDENT: &str = "custom_attribute_value/double_value";
pub const VALUE_DOUBLE_ID: u64 = 34;

/// Entity ids up to this one are reserved for the bootstrapped schema.
pub const RESERVED_ENTITY_IDS: u64 = 100;
