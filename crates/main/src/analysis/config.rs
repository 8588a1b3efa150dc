////////////////////////////////////////////////////////////////////////////////
// This file is part of "Ad Astra", an embeddable scripting programming       //
// language platform.                                                         //
//                                                                            //
// This work is proprietary software with source-available code.              //
//                                                                            //
// To copy, use, distribute, or contribute to this work, you must agree to    //
// the terms of the General License Agreement:                                //
//                                                                            //
// https://github.com/Eliah-Lakhin/ad-astra/blob/master/EULA.md               //
//                                                                            //
// The agreement grants a Basic Commercial License, allowing you to use       //
// this work in non-commercial and limited commercial products with a total   //
// gross revenue cap. To remove this commercial limit for one of your         //
// products, you must acquire a Full Commercial License.                      //
//                                                                            //
// If you contribute to the source code, documentation, or related materials, //
// you must grant me an exclusive license to these contributions.             //
// Contributions are governed by the "Contributions" section of the General   //
// License Agreement.                                                         //
//                                                                            //
// Copying the work in parts is strictly forbidden, except as permitted       //
// under the General License Agreement.                                       //
//                                                                            //
// If you do not or cannot agree to the terms of this Agreement,              //
// do not use this work.                                                      //
//                                                                            //
// This work is provided "as is", without any warranties, express or implied, //
// except where such disclaimers are legally invalid.                         //
//                                                                            //
// Copyright (c) 2024 Ilya Lakhin (Илья Александрович Лахин).                 //
// All rights reserved.                                                       //
////////////////////////////////////////////////////////////////////////////////

use std::time::Duration;

use compact_str::CompactString;

use crate::analysis::BUILTINS_PACKAGE;

/// A general configuration object of the
/// [ResolveSession](crate::analysis::ResolveSession).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
pub struct ResolveConfig {
    /// Packages imported into every file and every code fragment, in lookup
    /// order.
    ///
    /// The default value is a single [builtins](BUILTINS_PACKAGE) package.
    pub default_imports: Vec<CompactString>,

    /// If set to true, the session memoizes the bindings of the full
    /// resolution requests per resolvable unit, and serves the subsequent
    /// full and partial requests for the same unit from the memo.
    ///
    /// The default value is true.
    pub cache_full_bindings: bool,

    /// The interval between cancellation checks while the thread is waiting
    /// for another thread that forces the same declaration.
    ///
    /// The default value is 10 milliseconds.
    pub wait_interval: Duration,

    /// The maximum number of name suggestions attached to an unresolved
    /// reference. Zero turns the suggestions off.
    ///
    /// The default value is 3.
    pub suggestions: usize,

    /// The minimal [closeness](crate::analysis::Closeness) percentage of a
    /// suggested name to the unresolved name.
    ///
    /// The default value is 50.
    pub suggestion_threshold: u16,
}

impl Default for ResolveConfig {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl ResolveConfig {
    /// The default constructor for this configuration object.
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            default_imports: vec![CompactString::from(BUILTINS_PACKAGE)],
            cache_full_bindings: true,
            wait_interval: Duration::from_millis(10),
            suggestions: 3,
            suggestion_threshold: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::analysis::ResolveConfig;

    #[test]
    fn test_config_defaults() {
        let config = ResolveConfig::default();

        assert_eq!(config, ResolveConfig::new());
        assert_eq!(config.default_imports.len(), 1);
        assert!(config.cache_full_bindings);
        assert_eq!(config.suggestions, 3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde() {
        let mut config = ResolveConfig::new();

        config.suggestions = 5;
        config.cache_full_bindings = false;

        let serialized = serde_json::to_string(&config).expect("Config serialization failure.");
        let deserialized = serde_json::from_str::<ResolveConfig>(&serialized)
            .expect("Config deserialization failure.");

        assert_eq!(config, deserialized);

        let partial = serde_json::from_str::<ResolveConfig>(r#"{"suggestions": 0}"#)
            .expect("Partial config deserialization failure.");

        assert_eq!(partial.suggestions, 0);
        assert_eq!(partial.default_imports, ResolveConfig::new().default_imports);
    }
}
