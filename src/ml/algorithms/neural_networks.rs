// # Neural Network Algorithms
//
// Placeholder module for future neural network implementations.
// Will include multi-layer perceptrons, activation functions, and backpropagation.
//
// ## Planned Algorithms
//
// - Multi-Layer Perceptron (MLP)
// - Convolutional Neural Networks (CNN)
// - Recurrent Neural Networks (RNN)
// - Attention mechanisms
// - Transformer architectures
//
// ## Activation Functions
//
// - ReLU, Leaky ReLU, ELU
// - Sigmoid, Tanh
// - Softmax
// - GELU, Swish
//
// ## Optimization
//
// - Backpropagation
// - Batch normalization
// - Dropout regularization
// - Gradient clipping
//
// This module is currently a placeholder and will be implemented in future releases.

use serde::{Serialize, Deserialize};

// Placeholder structures for future implementation

// Multi-layer perceptron neural network (placeholder)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralNetwork {
    _layers: Vec<usize>,
    _trained: bool,
}

impl NeuralNetwork {
    // Create a new neural network (placeholder)
    pub fn new(_layer_sizes: Vec<usize>) -> Self {
        Self {
            _layers: _layer_sizes,
            _trained: false,
        }
    }
}

// Note: Algorithm trait implementation will be added when neural networks are fully implemented
