//! Saving and loading networks as XML documents.
//!
//! Layers, neurons and connections are identified by their `Index`
//! attribute rather than by their position, so hand-edited documents may list
//! them in any order. Momentum and caches are never saved; a loaded network
//! starts with both zeroed.

use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::matrix::Mat;
use crate::network::Network;
use crate::transfer::TransferFunction;

use log::debug;
use quick_xml::events::Event;
use quick_xml::{DeError, Reader};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The document type written by, and accepted by, this module.
pub const DOCUMENT_TYPE: &str = "BackPropagation";

const ROOT: &str = "NeuralNetwork";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "NeuralNetwork")]
struct Document {
    #[serde(rename = "@Type")]
    kind: String,
    #[serde(rename = "Parameters")]
    parameters: Parameters,
    #[serde(rename = "Weights")]
    weights: Weights,
}

/// Just enough of a document to tell whether it is ours.
#[derive(Debug, Deserialize)]
struct Header {
    #[serde(rename = "@Type")]
    kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Parameters {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "inputSize")]
    input_size: usize,
    #[serde(rename = "layerCount")]
    layer_count: usize,
    #[serde(rename = "Layers")]
    layers: Shapes,
}

#[derive(Debug, Serialize, Deserialize)]
struct Shapes {
    #[serde(rename = "Layer", default)]
    layers: Vec<Shape>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Shape {
    #[serde(rename = "@Index")]
    index: usize,
    #[serde(rename = "@Size")]
    size: usize,
    #[serde(rename = "@Type")]
    function: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Weights {
    #[serde(rename = "Layer", default)]
    layers: Vec<LayerWeights>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LayerWeights {
    #[serde(rename = "@Index")]
    index: usize,
    #[serde(rename = "Node", default)]
    nodes: Vec<Node>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Node {
    #[serde(rename = "@Index")]
    index: usize,
    #[serde(rename = "@Bias")]
    bias: f64,
    #[serde(rename = "Axon", default)]
    axons: Vec<Axon>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Axon {
    #[serde(rename = "@Index")]
    index: usize,
    #[serde(rename = "$text")]
    weight: f64,
}

/// Anything in a document that is addressed by an `Index` attribute.
trait Indexed {
    fn index(&self) -> usize;
}

macro_rules! indexed {
    ($($t:ty),*) => {
        $(impl Indexed for $t {
            fn index(&self) -> usize {
                self.index
            }
        })*
    };
}

indexed!(Shape, LayerWeights, Node, Axon);

/// Finds the element with the given `index`, naming `path` if it is absent.
fn find<'a, T: Indexed>(
    items: &'a [T],
    index: usize,
    path: impl FnOnce() -> String,
) -> Result<&'a T> {
    items
        .iter()
        .find(|item| item.index() == index)
        .ok_or_else(|| Error::MissingField(path()))
}

impl<'a> From<&'a Network> for Document {
    fn from(network: &'a Network) -> Self {
        let shapes = network
            .layers()
            .iter()
            .enumerate()
            .map(|(l, layer)| Shape {
                index: l,
                size: layer.output_len(),
                function: layer.transfer_function().name().into(),
            })
            .collect();
        let weights = network
            .layers()
            .iter()
            .enumerate()
            .map(|(l, layer)| LayerWeights {
                index: l,
                nodes: (0..layer.output_len())
                    .map(|j| Node {
                        index: j,
                        bias: layer.bias()[j],
                        axons: (0..layer.input_len())
                            .map(|i| Axon {
                                index: i,
                                weight: layer.weights()[(i, j)],
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Document {
            kind: DOCUMENT_TYPE.into(),
            parameters: Parameters {
                name: network.name().into(),
                input_size: network.input_len(),
                layer_count: network.layer_count(),
                layers: Shapes { layers: shapes },
            },
            weights: Weights { layers: weights },
        }
    }
}

impl Document {
    fn into_network(self) -> Result<Network> {
        let parameters = self.parameters;
        if parameters.input_size == 0 {
            return Err(invalid("inputSize", parameters.input_size));
        }
        if parameters.layer_count == 0 {
            return Err(invalid("layerCount", parameters.layer_count));
        }

        // Counts come from the document, so nothing is sized from them until
        // every element they promise has been found.
        let mut layers = Vec::new();
        let mut inputs = parameters.input_size;
        for l in 0..parameters.layer_count {
            let shape = find(&parameters.layers.layers, l, || {
                format!("NeuralNetwork/Parameters/Layers/Layer[@Index='{}']", l)
            })?;
            let function: TransferFunction = shape.function.parse()?;
            if function == TransferFunction::None {
                return Err(invalid(&format!("layer {} type", l), function));
            }
            if shape.size == 0 {
                return Err(invalid(&format!("layer {} size", l), shape.size));
            }

            let base = format!("NeuralNetwork/Weights/Layer[@Index='{}']", l);
            let saved = find(&self.weights.layers, l, || base.clone())?;
            let mut bias = Vec::new();
            let mut columns = Vec::new();
            for j in 0..shape.size {
                let node = find(&saved.nodes, j, || format!("{}/Node[@Index='{}']", base, j))?;
                let mut column = Vec::new();
                for i in 0..inputs {
                    let axon = find(&node.axons, i, || {
                        format!("{}/Node[@Index='{}']/Axon[@Index='{}']", base, j, i)
                    })?;
                    column.push(axon.weight);
                }
                bias.push(node.bias);
                columns.push(column);
            }

            let mut weights = Mat::zeros(inputs, shape.size);
            for (j, column) in columns.iter().enumerate() {
                for (i, &weight) in column.iter().enumerate() {
                    weights[(i, j)] = weight;
                }
            }
            layers.push(Layer::from_parameters(function, weights, bias));
            inputs = shape.size;
        }
        Ok(Network::from_layers(parameters.name, parameters.input_size, layers))
    }
}

/// Fails unless the first element of `xml` is the `NeuralNetwork` root.
fn check_root(xml: &str) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().map_err(DeError::from)? {
            Event::Start(e) | Event::Empty(e) => {
                if e.name().as_ref() == ROOT.as_bytes() {
                    return Ok(());
                }
                return Err(Error::MissingField(ROOT.into()));
            }
            Event::Eof => return Err(Error::MissingField(ROOT.into())),
            _ => {}
        }
    }
}

fn invalid<T: ToString>(field: &str, value: T) -> Error {
    Error::InvalidValue {
        field: field.into(),
        value: value.to_string(),
    }
}

impl Network {
    /// Renders the network's topology, weights and biases as a
    /// tab-indented XML document.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut xml);
        serializer.indent('\t', 1);
        Document::from(self).serialize(serializer)?;
        Ok(xml)
    }

    /// Writes the network to `path` as XML.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_xml()?)?;
        debug!("saved network {:?} to {}", self.name(), path.display());
        Ok(())
    }

    /// Parses a saved network.
    ///
    /// Returns `Ok(None)` if the document's root `Type` is not
    /// `BackPropagation`; such documents are ignored rather than rejected.
    pub fn from_xml(xml: &str) -> Result<Option<Network>> {
        check_root(xml)?;
        let header: Header = quick_xml::de::from_str(xml)?;
        if header.kind != DOCUMENT_TYPE {
            debug!("ignoring network document of type {:?}", header.kind);
            return Ok(None);
        }
        let document: Document = quick_xml::de::from_str(xml)?;
        document.into_network().map(Some)
    }

    /// Replaces this network with the one saved in `xml`.
    ///
    /// A document of another type leaves the network untouched and is not
    /// an error. On any error the network is also left untouched.
    pub fn load_xml(&mut self, xml: &str) -> Result<()> {
        if let Some(network) = Network::from_xml(xml)? {
            debug!(
                "loaded network {:?} with widths {:?}",
                network.name(),
                network.layer_widths()
            );
            *self = network;
        }
        Ok(())
    }

    /// Replaces this network with the one saved at `path`. See
    /// [`Network::load_xml`].
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let xml = fs::read_to_string(path)?;
        self.load_xml(&xml)
    }

    /// Reads a saved network from `path`, or `None` if the file holds a
    /// document of another type.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Option<Network>> {
        let xml = fs::read_to_string(path)?;
        Network::from_xml(&xml)
    }
}
